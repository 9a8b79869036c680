//! Constant values of the COMBINE archive format.
//!
//! This module contains the well-known locations inside the container, the
//! format URIs with a special meaning in the manifest, and the XML namespaces
//! used by manifest and metadata documents.

/// Well-known locations inside the container
pub mod location {
    /// Entity path of the archive itself in manifest and metadata documents
    pub const ARCHIVE: &str = ".";
    /// The manifest document
    pub const MANIFEST: &str = "/manifest.xml";
    /// The default (combined) metadata document
    pub const METADATA: &str = "/metadata.rdf";
    /// File name prefix of additional metadata documents (`metadata-N.rdf`)
    pub const METADATA_PREFIX: &str = "metadata-";
    /// File name suffix of metadata documents
    pub const METADATA_SUFFIX: &str = ".rdf";
}

/// Format URIs that describe archive internals
pub mod format {
    /// The archive itself
    pub const OMEX: &str = "http://identifiers.org/combine.specifications/omex";
    /// The manifest document
    pub const MANIFEST: &str = "http://identifiers.org/combine.specifications/omex-manifest";
    /// A metadata document
    pub const METADATA: &str = "http://identifiers.org/combine.specifications/omex-metadata";
    /// Namespace under which MIME types are turned into format URIs
    pub const MEDIATYPES: &str = "http://purl.org/NET/mediatypes/";
}

/// XML namespaces
pub mod namespace {
    /// OMEX manifest
    pub const MANIFEST: &str = "http://identifiers.org/combine.specifications/omex-manifest";
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const DCTERMS: &str = "http://purl.org/dc/terms/";
    pub const VCARD: &str = "http://www.w3.org/2006/vcard/ns#";
}

/// Conventional prefixes for the namespaces above
pub mod prefix {
    pub const RDF: &str = "rdf";
    pub const DCTERMS: &str = "dcterms";
    pub const VCARD: &str = "vCard";
}

/// W3CDTF timestamp layout written to metadata documents
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
