//! Error types
//!
//! Defines domain-specific error types for each module of the tree server.

use std::fmt;
use std::io;

/// Why an insertion target is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// A node with the same name already sits at the path.
    Occupied,
    /// A parent segment does not resolve to an existing node.
    MissingParent,
    /// A parent segment resolves to a file.
    ParentIsFile,
    /// A sibling with a different name already owns the sanitized key.
    KeyCollision,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::Occupied => write!(f, "path already exists"),
            ConflictReason::MissingParent => write!(f, "parent folder does not exist"),
            ConflictReason::ParentIsFile => write!(f, "parent is a file"),
            ConflictReason::KeyCollision => write!(f, "sibling name collides after key sanitization"),
        }
    }
}

/// Tree engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    InvalidType(String),
    InvalidName(String),
    PathConflict { path: String, reason: ConflictReason },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::InvalidType(t) => write!(f, "Invalid node type: {}", t),
            TreeError::InvalidName(p) => write!(f, "Invalid name: {}", p),
            TreeError::PathConflict { path, reason } => {
                write!(f, "Path conflict at {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Document store errors
#[derive(Debug)]
pub enum StoreError {
    Unavailable(String),
    Timeout(&'static str),
    Io(io::Error),
    Corrupt(String),
    DocumentNotFound(String),
    DuplicateProject(String),
    VersionConflict { expected: u64, found: u64 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Timeout(op) => write!(f, "Store operation timed out: {}", op),
            StoreError::Io(e) => write!(f, "Store IO error: {}", e),
            StoreError::Corrupt(msg) => write!(f, "Corrupt document: {}", msg),
            StoreError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            StoreError::DuplicateProject(id) => {
                write!(f, "Document already exists for project: {}", id)
            }
            StoreError::VersionConflict { expected, found } => write!(
                f,
                "Version conflict: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        StoreError::Io(error)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Corrupt(error.to_string())
    }
}

/// Project lookup errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    UnknownProject(String),
    EmptyIdentifier,
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::UnknownProject(p) => write!(f, "Unknown project: {}", p),
            ProjectError::EmptyIdentifier => write!(f, "Project name or id is required"),
        }
    }
}

impl std::error::Error for ProjectError {}

/// General service error that encompasses all error types
#[derive(Debug)]
pub enum ServiceError {
    Tree(TreeError),
    Store(StoreError),
    Project(ProjectError),
    ProtocolError(String),
    RequestTooLong(usize),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Tree(e) => write!(f, "Tree error: {}", e),
            ServiceError::Store(e) => write!(f, "Store error: {}", e),
            ServiceError::Project(e) => write!(f, "Project error: {}", e),
            ServiceError::ProtocolError(e) => write!(f, "Protocol error: {}", e),
            ServiceError::RequestTooLong(limit) => write!(f, "Request exceeds {} bytes", limit),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<TreeError> for ServiceError {
    fn from(error: TreeError) -> Self {
        ServiceError::Tree(error)
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        ServiceError::Store(error)
    }
}

impl From<ProjectError> for ServiceError {
    fn from(error: ProjectError) -> Self {
        ServiceError::Project(error)
    }
}
