//! Document persistence
//!
//! The stored document form of a project tree, its codec, and the
//! document store backends.

pub mod backend;
pub mod codec;
pub mod document;
pub mod file;
pub mod memory;

pub use backend::DocumentStore;
pub use document::{Children, Document, DocumentNode, WriteConcern};
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;
