//! Per-project mutation locks
//!
//! Serializes fetch → mutate → persist cycles for the same project inside
//! one process. Different projects never wait on each other, and a project
//! is forgotten again once nobody holds or waits for its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct ProjectLocks {
    locks: Arc<StdMutex<LockMap>>,
}

/// Exclusive access to one project; released when dropped.
pub struct ProjectGuard {
    project_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `project_id`.
    pub async fn acquire(&self, project_id: &str) -> ProjectGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(project_id.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;
        ProjectGuard {
            project_id: project_id.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold their own clone, so a count of one means the map is the last owner.
        if locks
            .get(&self.project_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.project_id);
        }
    }
}
