//! In-memory document store

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::backend::DocumentStore;
use crate::store::document::{Children, Document, WriteConcern};

/// Documents held in a map keyed by document id. Lost on shutdown.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_by_project_id(&self, project_id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .find(|doc| doc.project_id == project_id)
            .cloned())
    }

    async fn insert_document(&self, document: Document) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        if documents
            .values()
            .any(|doc| doc.project_id == document.project_id)
        {
            return Err(StoreError::DuplicateProject(document.project_id));
        }
        debug!(
            "Inserted document {} for project {}",
            document.id, document.project_id
        );
        documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn replace_children(
        &self,
        document_id: &str,
        children: Children,
        expected_version: u64,
        _concern: WriteConcern,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(document_id)
            .ok_or_else(|| StoreError::DocumentNotFound(document_id.to_string()))?;

        if document.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: document.version,
            });
        }

        document.children = children;
        document.version += 1;
        Ok(document.version)
    }

    async fn find_by_id(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(document_id).cloned())
    }
}
