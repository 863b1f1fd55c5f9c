//! File-backed document store
//!
//! Keeps one pretty-printed JSON file per document under a root directory,
//! plus an `index/` entry per project naming its document. Writes go to a
//! temporary sibling that is renamed over the target, so a reader never
//! observes a half-written file.
//!
//! Every check-then-write runs under an exclusive `.lock` file in the root,
//! so several processes can share one directory.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::backend::DocumentStore;
use crate::store::document::{Children, Document, WriteConcern};

const WRITE_RETRIES: u64 = 3;
const INDEX_DIR: &str = "index";
const LOCK_FILE: &str = ".lock";
const LOCK_POLL: Duration = Duration::from_millis(10);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// A lock file older than this is left over from a crashed writer.
const STALE_LOCK: Duration = Duration::from_secs(30);

/// Maps a project to its document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
    project_id: String,
    id: String,
}

/// Held while the store's `.lock` file exists; removes it on drop.
struct DiskLock {
    path: PathBuf,
}

impl Drop for DiskLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

pub struct FileDocumentStore {
    root: PathBuf,
    lock_timeout: Duration,
    // Keeps writers in this process from polling the lock file against each other.
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(INDEX_DIR)).await.map_err(|e| {
            error!("Failed to create store root {}: {}", root.display(), e);
            StoreError::Unavailable(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self {
            root,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            write_lock: Mutex::new(()),
        })
    }

    /// How long a writer waits for another process to release the store.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, document_id: &str) -> Option<PathBuf> {
        let safe = !document_id.is_empty()
            && document_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.root.join(format!("{}.json", document_id)))
    }

    fn index_path(&self, project_id: &str) -> PathBuf {
        // Project ids are free-form; a name-based uuid gives a fixed-size file name.
        let key = Uuid::new_v5(&Uuid::NAMESPACE_OID, project_id.as_bytes());
        self.root
            .join(INDEX_DIR)
            .join(format!("{}.json", key.simple()))
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Document>, StoreError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    async fn read_index(&self, project_id: &str) -> Result<Option<IndexEntry>, StoreError> {
        let entry: IndexEntry = match fs::read(self.index_path(project_id)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::from(e)),
        };
        if entry.project_id != project_id {
            return Err(StoreError::Corrupt(format!(
                "index entry for {} names project {}",
                project_id, entry.project_id
            )));
        }
        Ok(Some(entry))
    }

    async fn write_document(
        &self,
        document: &Document,
        concern: WriteConcern,
    ) -> Result<(), StoreError> {
        let path = self
            .document_path(&document.id)
            .ok_or_else(|| StoreError::DocumentNotFound(document.id.clone()))?;
        write_atomic(&path, &serde_json::to_vec_pretty(document)?, concern).await?;
        debug!("Wrote document {} (v{})", document.id, document.version);
        Ok(())
    }

    /// Waits for the store-wide lock file, clearing one left by a dead writer.
    async fn lock_store(&self) -> Result<DiskLock, StoreError> {
        let path = self.root.join(LOCK_FILE);
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match created {
                Ok(mut file) => {
                    // Holder pid, for whoever has to inspect a stuck lock
                    if let Err(e) = file.write_all(std::process::id().to_string().as_bytes()).await {
                        debug!("Could not record lock holder: {}", e);
                    }
                    return Ok(DiskLock { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.clear_stale_lock(&path).await {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        warn!("Gave up waiting for {}", path.display());
                        return Err(StoreError::Timeout("store lock"));
                    }
                    tokio::time::sleep(LOCK_POLL).await;
                }
                Err(e) => return Err(StoreError::from(e)),
            }
        }
    }

    /// True when the lock is gone or was removed for being stale.
    async fn clear_stale_lock(&self, path: &Path) -> bool {
        let modified = match fs::metadata(path).await.and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => return true,
            Err(_) => return false,
        };
        let age = modified.elapsed().unwrap_or_default();
        if age < STALE_LOCK {
            return false;
        }
        warn!(
            "Removing stale store lock {} ({}s old)",
            path.display(),
            age.as_secs()
        );
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) => e.kind() == ErrorKind::NotFound,
        }
    }
}

/// Writes `payload` to a temporary sibling of `path`, then renames it over `path`.
async fn write_atomic(path: &Path, payload: &[u8], concern: WriteConcern) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(payload).await?;
    if concern == WriteConcern::Synced {
        file.sync_all().await?;
    }
    drop(file);

    for attempt in 1..=WRITE_RETRIES {
        match fs::rename(&tmp_path, path).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < WRITE_RETRIES && e.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    "Rename of {} denied (attempt {}), retrying",
                    path.display(),
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(100 * attempt)).await;
            }
            Err(e) => {
                error!("Failed to persist {}: {}", path.display(), e);
                return Err(StoreError::from(e));
            }
        }
    }

    Err(StoreError::Unavailable(format!(
        "failed to persist {} after retries",
        path.display()
    )))
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn find_by_project_id(&self, project_id: &str) -> Result<Option<Document>, StoreError> {
        let Some(entry) = self.read_index(project_id).await? else {
            return Ok(None);
        };
        match self.find_by_id(&entry.id).await? {
            Some(document) if document.project_id == project_id => Ok(Some(document)),
            Some(document) => Err(StoreError::Corrupt(format!(
                "index for {} points at document {} of project {}",
                project_id, document.id, document.project_id
            ))),
            None => Err(StoreError::Corrupt(format!(
                "index for {} points at missing document {}",
                project_id, entry.id
            ))),
        }
    }

    async fn insert_document(&self, document: Document) -> Result<Document, StoreError> {
        let _local = self.write_lock.lock().await;
        let _disk = self.lock_store().await?;

        if self.read_index(&document.project_id).await?.is_some() {
            return Err(StoreError::DuplicateProject(document.project_id));
        }

        // Document first: a reader that finds the index entry finds the document too.
        self.write_document(&document, WriteConcern::Synced).await?;
        let entry = IndexEntry {
            project_id: document.project_id.clone(),
            id: document.id.clone(),
        };
        write_atomic(
            &self.index_path(&document.project_id),
            &serde_json::to_vec(&entry)?,
            WriteConcern::Synced,
        )
        .await?;

        info!(
            "Created document {} for project {}",
            document.id, document.project_id
        );
        Ok(document)
    }

    async fn replace_children(
        &self,
        document_id: &str,
        children: Children,
        expected_version: u64,
        concern: WriteConcern,
    ) -> Result<u64, StoreError> {
        let _local = self.write_lock.lock().await;
        let _disk = self.lock_store().await?;

        let mut document = self
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound(document_id.to_string()))?;

        if document.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: document.version,
            });
        }

        document.children = children;
        document.version += 1;
        self.write_document(&document, concern).await?;
        Ok(document.version)
    }

    async fn find_by_id(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        match self.document_path(document_id) {
            Some(path) => self.read_document(&path).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn docs_folder() -> Children {
        let mut children = Children::new();
        children.insert(
            "docs".into(),
            json!({"name": "docs", "path": "docs", "type": "folder", "created": "t", "author": null, "children": {}}),
        );
        children
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = tempdir().unwrap();
        let id = {
            let store = FileDocumentStore::open(dir.path()).await.unwrap();
            let doc = store.insert_document(Document::new("p-1")).await.unwrap();
            store
                .replace_children(&doc.id, docs_folder(), 0, WriteConcern::Synced)
                .await
                .unwrap();
            doc.id
        };

        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        let doc = store.find_by_project_id("p-1").await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.version, 1);
        assert_eq!(doc.children["docs"]["type"], "folder");
        assert!(!dir.path().join(LOCK_FILE).exists());
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        let doc = store.insert_document(Document::new("p-1")).await.unwrap();
        store
            .replace_children(&doc.id, Children::new(), 0, WriteConcern::Acknowledged)
            .await
            .unwrap();
        let err = store
            .replace_children(&doc.id, Children::new(), 0, WriteConcern::Acknowledged)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { found: 1, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_project_and_unsafe_ids() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        store.insert_document(Document::new("p-1")).await.unwrap();
        assert!(matches!(
            store.insert_document(Document::new("p-1")).await,
            Err(StoreError::DuplicateProject(_))
        ));
        assert!(store.find_by_id("../etc/passwd").await.unwrap().is_none());
        assert!(store.find_by_id("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        assert!(matches!(
            store.find_by_id("broken").await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_unrelated_files_do_not_affect_projects() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), br#"{"hello":1}"#).unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();

        assert!(store.find_by_project_id("alpha").await.unwrap().is_none());
        let doc = store.insert_document(Document::new("alpha")).await.unwrap();
        let found = store.find_by_project_id("alpha").await.unwrap().unwrap();
        assert_eq!(found.id, doc.id);
        assert!(store.find_by_project_id("beta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_project_ids_with_path_characters() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        let doc = store.insert_document(Document::new("../team/site")).await.unwrap();
        let found = store.find_by_project_id("../team/site").await.unwrap().unwrap();
        assert_eq!(found.id, doc.id);
        assert!(store.find_by_project_id("team/site").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_stores_on_one_directory_do_not_race() {
        let dir = tempdir().unwrap();
        let left = Arc::new(FileDocumentStore::open(dir.path()).await.unwrap());
        let right = Arc::new(FileDocumentStore::open(dir.path()).await.unwrap());

        for round in 0..20 {
            let project = format!("p-{round}");

            let a = tokio::spawn({
                let (store, project) = (Arc::clone(&left), project.clone());
                async move { store.insert_document(Document::new(project)).await }
            });
            let b = tokio::spawn({
                let (store, project) = (Arc::clone(&right), project.clone());
                async move { store.insert_document(Document::new(project)).await }
            });
            let inserted = [a.await.unwrap(), b.await.unwrap()];
            assert_eq!(inserted.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(
                inserted
                    .iter()
                    .any(|r| matches!(r, Err(StoreError::DuplicateProject(_))))
            );

            let doc = left.find_by_project_id(&project).await.unwrap().unwrap();
            assert_eq!(
                right.find_by_project_id(&project).await.unwrap().unwrap().id,
                doc.id
            );

            let a = tokio::spawn({
                let (store, id) = (Arc::clone(&left), doc.id.clone());
                async move {
                    store
                        .replace_children(&id, docs_folder(), 0, WriteConcern::Acknowledged)
                        .await
                }
            });
            let b = tokio::spawn({
                let (store, id) = (Arc::clone(&right), doc.id.clone());
                async move {
                    store
                        .replace_children(&id, Children::new(), 0, WriteConcern::Acknowledged)
                        .await
                }
            });
            let written = [a.await.unwrap(), b.await.unwrap()];
            assert_eq!(written.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(
                written
                    .iter()
                    .any(|r| matches!(r, Err(StoreError::VersionConflict { found: 1, .. })))
            );
        }
    }

    #[tokio::test]
    async fn test_held_lock_times_out_and_stale_lock_is_cleared() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path())
            .await
            .unwrap()
            .with_lock_timeout(Duration::from_millis(100));

        let lock_path = dir.path().join(LOCK_FILE);
        let held = std::fs::File::create(&lock_path).unwrap();
        assert!(matches!(
            store.insert_document(Document::new("p-1")).await,
            Err(StoreError::Timeout("store lock"))
        ));

        held.set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();
        drop(held);
        store.insert_document(Document::new("p-1")).await.unwrap();
        assert!(!lock_path.exists());
    }
}
