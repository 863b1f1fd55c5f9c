//! Structure store
//!
//! Owns the read-modify-write cycle against the document store: fetch or
//! create the project's document, let the tree engine mutate it, persist
//! the children with a version check, then re-read the stored copy.

use chrono::Utc;
use log::{debug, info, warn};
use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::{ServiceError, StoreError};
use crate::project::ProjectLookup;
use crate::service::locks::ProjectLocks;
use crate::service::results::{CreateNode, NodeRequest, TreeSnapshot};
use crate::store::codec::{decode, encode_children};
use crate::store::{Document, DocumentStore, WriteConcern};
use crate::tree::validation::validate_name;
use crate::tree::{NodeDraft, NodeType};

pub struct StructureStore {
    documents: Arc<dyn DocumentStore>,
    projects: Arc<dyn ProjectLookup>,
    settings: StoreConfig,
    locks: ProjectLocks,
}

impl StructureStore {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        projects: Arc<dyn ProjectLookup>,
        settings: StoreConfig,
    ) -> Self {
        Self {
            documents,
            projects,
            settings,
            locks: ProjectLocks::new(),
        }
    }

    /// Returns the project's tree, creating an empty one on first access.
    pub async fn get_tree(&self, project: &str) -> Result<TreeSnapshot, ServiceError> {
        let project_id = self.projects.resolve(project)?;
        let document = self.fetch_or_create(&project_id).await?;
        Ok(TreeSnapshot::from_tree(decode(document)?))
    }

    /// Adds a file or folder and returns the tree as stored afterwards.
    ///
    /// Type and name are checked before the store is touched. A stale write
    /// is retried from a fresh read up to `max_retries` times.
    pub async fn create_node(&self, request: CreateNode) -> Result<TreeSnapshot, ServiceError> {
        let CreateNode {
            project,
            path,
            node_type,
            author,
        } = request;
        self.create_nodes(
            &project,
            vec![NodeRequest {
                path,
                node_type,
                author,
            }],
        )
        .await
    }

    /// Adds several nodes with a single write.
    ///
    /// Entries are applied in order, so a folder may be followed by its
    /// contents. If any entry is rejected nothing is persisted.
    pub async fn create_nodes(
        &self,
        project: &str,
        nodes: Vec<NodeRequest>,
    ) -> Result<TreeSnapshot, ServiceError> {
        if nodes.is_empty() {
            return Err(ServiceError::ProtocolError("no nodes to create".into()));
        }

        let created = self.timestamp();
        let mut drafts = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node_type: NodeType = node.node_type.parse()?;
            validate_name(&node.path)?;
            let draft = NodeDraft::new(node_type, created.clone()).with_author(node.author);
            drafts.push((node.path, draft));
        }
        let project_id = self.projects.resolve(project)?;

        let _guard = self.locks.acquire(&project_id).await;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let document = self.fetch_or_create(&project_id).await?;
            let mut tree = decode(document)?;
            for (path, draft) in &drafts {
                tree.insert(path, draft.clone())?;
            }

            // Not cancelled by the deadline: an abandoned write could still land.
            let written = self
                .documents
                .replace_children(
                    tree.revision_id(),
                    encode_children(&tree),
                    tree.version(),
                    self.write_concern(),
                )
                .await;

            match written {
                Ok(version) => {
                    match drafts.as_slice() {
                        [(path, draft)] => info!(
                            "Created {} {} in project {} (v{})",
                            draft.node_type, path, project_id, version
                        ),
                        _ => info!(
                            "Created {} nodes in project {} (v{})",
                            drafts.len(),
                            project_id,
                            version
                        ),
                    }
                    return self.refresh(tree.revision_id()).await;
                }
                Err(StoreError::VersionConflict { expected, found })
                    if attempt < self.settings.max_retries =>
                {
                    warn!(
                        "Stale write for project {} (expected v{}, found v{}), retrying ({}/{})",
                        project_id, expected, found, attempt, self.settings.max_retries
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn fetch_or_create(&self, project_id: &str) -> Result<Document, StoreError> {
        if let Some(document) = self
            .with_deadline(
                "find_by_project_id",
                self.documents.find_by_project_id(project_id),
            )
            .await?
        {
            return Ok(document);
        }

        let created = self
            .documents
            .insert_document(Document::new(project_id))
            .await;

        match created {
            Ok(document) => {
                info!(
                    "Created empty tree for project {} (document {})",
                    project_id, document.id
                );
                Ok(document)
            }
            Err(StoreError::DuplicateProject(_)) => {
                debug!("Project {} created concurrently, re-reading", project_id);
                self.with_deadline(
                    "find_by_project_id",
                    self.documents.find_by_project_id(project_id),
                )
                .await?
                .ok_or_else(|| StoreError::DocumentNotFound(project_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh(&self, revision_id: &str) -> Result<TreeSnapshot, ServiceError> {
        let document = self
            .with_deadline("find_by_id", self.documents.find_by_id(revision_id))
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound(revision_id.to_string()))?;
        Ok(TreeSnapshot::from_tree(decode(document)?))
    }

    /// Bounds a read. Writes are left to finish so a reported failure
    /// never hides a committed change.
    async fn with_deadline<T, F>(&self, operation: &'static str, future: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.settings.timeout(), future)
            .await
            .map_err(|_| StoreError::Timeout(operation))?
    }

    fn write_concern(&self) -> WriteConcern {
        if self.settings.sync_writes {
            WriteConcern::Synced
        } else {
            WriteConcern::Acknowledged
        }
    }

    fn timestamp(&self) -> String {
        let now = Utc::now();
        let mut out = String::new();
        if write!(out, "{}", now.format(&self.settings.time_format)).is_err() {
            return now.to_rfc3339();
        }
        out
    }
}
