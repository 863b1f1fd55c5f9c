//! Structure store service
//!
//! Ties project lookup, the tree engine and the document store together
//! behind the `create_node` / `create_nodes` / `get_tree` operations.

pub mod locks;
pub mod operations;
pub mod results;

pub use operations::StructureStore;
pub use results::{CreateNode, NodeRequest, TreeSnapshot};
