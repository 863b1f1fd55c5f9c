//! Client management system
//!
//! Handles client connections, session bookkeeping, and the request loop.

pub mod handler;
pub mod registry;

pub use handler::handle_client;
pub use registry::{ClientRegistry, ClientSession};
