//! Project identity lookup

pub mod directory;

pub use directory::{ProjectDirectory, ProjectLookup};
