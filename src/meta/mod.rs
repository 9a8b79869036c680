//! Archive metadata.
//!
//! Descriptions live on the entities they describe (the archive, its entries
//! and its metadata documents) and point back at them by id. This module
//! holds the description types and the readers and writers of the RDF
//! documents that store them.

pub mod holder;
pub mod object;
pub mod omex;
pub mod reader;
pub mod vcard;
pub mod writer;

pub use holder::{Describable, PseudoEntity};
pub use object::{About, EntityId, MetaDataObject, MetaDataPayload};
pub use omex::OmexDescription;
pub use reader::{AboutTarget, EntityTargets};
pub use vcard::VCard;

use crate::archive::constants::{namespace, prefix};
use crate::common::xml::XmlElement;

/// Mark `element` as `rdf:parseType="Resource"`.
pub(crate) fn parse_type_resource(element: XmlElement) -> XmlElement {
    element.with_attribute(Some(namespace::RDF), Some(prefix::RDF), "parseType", "Resource")
}
