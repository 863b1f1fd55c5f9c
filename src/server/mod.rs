//! Server core functionality
//!
//! Listener, accept loop and assembly of the structure store from
//! configuration.

pub mod core;

pub use self::core::{Server, build_store};
