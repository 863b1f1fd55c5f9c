//! Document store abstraction
//!
//! The persistence collaborator behind the structure store. Implementations
//! must make `replace_children` a compare-and-swap on the document version.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::document::{Children, Document, WriteConcern};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document owned by `project_id`, if any.
    async fn find_by_project_id(&self, project_id: &str) -> Result<Option<Document>, StoreError>;

    /// Stores a new document. Fails with [`StoreError::DuplicateProject`]
    /// when the project already has one.
    async fn insert_document(&self, document: Document) -> Result<Document, StoreError>;

    /// Replaces the whole `children` mapping of a document if its version
    /// still equals `expected_version`, returning the new version.
    async fn replace_children(
        &self,
        document_id: &str,
        children: Children,
        expected_version: u64,
        concern: WriteConcern,
    ) -> Result<u64, StoreError>;

    async fn find_by_id(&self, document_id: &str) -> Result<Option<Document>, StoreError>;
}
