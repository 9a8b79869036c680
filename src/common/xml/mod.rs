//! XML helpers shared by the manifest and metadata layers.
//!
//! Documents are parsed with `quick-xml` into a small owned element tree that
//! keeps namespace URIs and the original prefixes, so opaque metadata can be
//! written back unchanged.

pub mod escape;
pub mod tree;

pub use escape::{escape_xml, resolve_reference, unescape_xml};
pub use tree::{XmlAttribute, XmlElement, XmlName, XmlNode};
