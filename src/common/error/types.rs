//! Unified error type for omex-archive.
//!
//! Every fallible operation in the crate reports one of these variants. In
//! lenient mode the archive records the `Display` form of content errors
//! instead of returning them.
use thiserror::Error;

/// Main error type for archive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The container could not be read or written as a ZIP archive
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Malformed manifest or metadata XML
    #[error("XML error: {0}")]
    XmlError(String),

    /// Container is not a usable COMBINE archive
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A required attribute is absent from a manifest or metadata element
    #[error("{element} {index} in {document} is missing the `{attribute}` attribute")]
    MissingAttribute {
        document: String,
        element: &'static str,
        index: usize,
        attribute: &'static str,
    },

    /// A format string is neither an absolute URI nor a MIME type
    #[error("format {format} of {location} is not a valid URI")]
    InvalidFormatUri { location: String, format: String },

    /// A file listed in the manifest is absent from the container
    #[error("{0} is mentioned in the manifest, but the archive does not contain such a file")]
    FileNotFound(String),

    /// A metadata description whose `about` matches no entity
    #[error("found no entry for description {index} in {document} (about={about})")]
    UnresolvedAbout {
        document: String,
        index: usize,
        about: String,
    },

    /// Attempt to place an entry at a location reserved for archive internals
    #[error("{0} is reserved for archive internals")]
    ReservedPath(String),

    /// A path that cannot name an entry
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No entry at the given path
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// An entry already occupies the target path
    #[error("Entry already exists: {0}")]
    EntryExists(String),

    /// A W3CDTF timestamp could not be parsed
    #[error("Date parse error: {0}")]
    DateParse(String),

    /// JSON export failed
    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
