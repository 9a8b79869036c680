//! COMBINE/OMEX archive packaging.
//!
//! This module provides the container side of an archive:
//!
//! - Entry paths and their normalization
//! - Format URIs and the short-name registry
//! - The entry index with its main entries
//! - Manifest parsing and generation
//! - The ZIP container and the [`CombineArchive`] tying it all together

pub mod constants;
pub mod entry;
pub mod formats;
pub mod manifest;
pub mod options;
pub mod package;
pub mod path;
pub mod phys_pkg;
pub mod store;

// Re-export commonly used types
pub use entry::{ArchiveEntry, EntryId};
pub use formats::FormatRegistry;
pub use options::ArchiveOptions;
pub use package::CombineArchive;
pub use path::EntryPath;
