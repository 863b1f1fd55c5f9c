//! Project directory
//!
//! Maps the identifier a client sends (a project name or an opaque id) to
//! the stable project id that owns a tree.

use std::collections::HashMap;

use crate::config::ProjectsConfig;
use crate::error::ProjectError;

/// Resolves client-supplied project identifiers.
pub trait ProjectLookup: Send + Sync {
    fn resolve(&self, name_or_id: &str) -> Result<String, ProjectError>;
}

/// Lookup table built from configuration.
///
/// Names are matched case-insensitively since the configuration loader
/// folds table keys to lowercase. Ids are matched exactly.
#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    by_name: HashMap<String, String>,
    accept_unlisted_ids: bool,
}

impl ProjectDirectory {
    pub fn new(accept_unlisted_ids: bool) -> Self {
        Self {
            by_name: HashMap::new(),
            accept_unlisted_ids,
        }
    }

    pub fn from_config(config: &ProjectsConfig) -> Self {
        let mut directory = Self::new(config.accept_unlisted_ids);
        for (name, id) in &config.registered {
            directory.register(name, id);
        }
        directory
    }

    pub fn register(&mut self, name: impl AsRef<str>, id: impl Into<String>) {
        self.by_name.insert(name.as_ref().to_lowercase(), id.into());
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl ProjectLookup for ProjectDirectory {
    fn resolve(&self, name_or_id: &str) -> Result<String, ProjectError> {
        let key = name_or_id.trim();
        if key.is_empty() {
            return Err(ProjectError::EmptyIdentifier);
        }
        if let Some(id) = self.by_name.get(&key.to_lowercase()) {
            return Ok(id.clone());
        }
        if self.by_name.values().any(|id| id == key) || self.accept_unlisted_ids {
            return Ok(key.to_string());
        }
        Err(ProjectError::UnknownProject(key.to_string()))
    }
}
