//! Common types and utilities shared by the archive and metadata layers.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, ErrorLog, Result};
