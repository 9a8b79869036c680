//! omex-archive - read and write COMBINE/OMEX archives
//!
//! A COMBINE archive is a ZIP file bundling the files of a modelling project
//! with a manifest (`manifest.xml`, listing every file with its format and
//! marking the main entries) and RDF metadata documents describing the
//! archive, its entries and fragments of them.
//!
//! # Features
//!
//! - **Entries**: add, remove, move and replace files; query by format
//! - **Main entries**: flag one or several entries as primary artifacts
//! - **Metadata**: OMEX descriptions (creators, dates, free text) and opaque
//!   RDF descriptions, resolved to their entities on read and regenerated on
//!   pack without duplicates
//! - **Lenient reading**: collect manifest and metadata problems instead of
//!   failing on the first one
//!
//! # Example - Creating an archive
//!
//! ```no_run
//! use omex_archive::archive::CombineArchive;
//! use omex_archive::meta::{Describable, MetaDataObject, OmexDescription, VCard};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut archive = CombineArchive::create("project.omex")?;
//! let sbml = Url::parse("http://identifiers.org/combine.specifications/sbml")?;
//! archive.add_entry("models/model.xml", "model.xml", &sbml, true)?;
//!
//! let creator = VCard::new("Doe", "Jane", "jane@example.org", "Example Lab");
//! let description = OmexDescription::new(creator, chrono::Utc::now())
//!     .with_description("A toy model");
//! archive.add_description(None, MetaDataObject::omex(description));
//!
//! archive.pack()?;
//! archive.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading an archive leniently
//!
//! ```no_run
//! use omex_archive::archive::{ArchiveOptions, CombineArchive};
//! use omex_archive::meta::Describable;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = CombineArchive::open_with_options("project.omex", ArchiveOptions::lenient())?;
//! for error in archive.errors() {
//!     eprintln!("problem: {}", error);
//! }
//! for entry in archive.entries() {
//!     println!("{} ({}) {} descriptions", entry.path(), entry.format(), entry.descriptions().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod common;
pub mod meta;

// Re-export commonly used types
pub use archive::{ArchiveEntry, ArchiveOptions, CombineArchive, EntryPath, FormatRegistry};
pub use common::{Error, Result};
pub use meta::{Describable, MetaDataObject, OmexDescription, VCard};
