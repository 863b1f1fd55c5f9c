//! Virtual file tree
//!
//! In-memory project tree, path helpers and the engine operations that
//! resolve, validate, insert and list entries.

pub mod node;
pub mod operations;
pub mod paths;
pub mod validation;

pub use node::{ChildEntry, Location, Node, NodeDraft, NodeId, NodeType, Tree};
pub use validation::{is_valid_base_name, is_valid_name};
