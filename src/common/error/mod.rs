//! Unified error types for omex-archive.
//!
//! This module provides the single error type shared by the container,
//! manifest and metadata layers, plus the lenient-mode error log.

// Submodule declarations
pub mod conversions;
pub mod sink;
pub mod types;

// Re-exports
pub use sink::ErrorLog;
pub use types::{Error, Result};
