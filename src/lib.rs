pub mod client;
pub mod config;
pub mod error;
pub mod project;
pub mod protocol;
pub mod server;
pub mod service;
pub mod store;
pub mod tree;
pub mod utils;

pub use config::ServerConfig;
pub use server::Server;
pub use service::{CreateNode, NodeRequest, StructureStore, TreeSnapshot};
pub use tree::{NodeType, Tree};
