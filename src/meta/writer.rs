//! Writing metadata documents.

use super::holder::Describable;
use crate::archive::constants::{namespace, prefix};
use crate::common::xml::XmlElement;

/// Render the descriptions of `entities` as one RDF document.
///
/// Entities are written in the order given, each description as one
/// `rdf:Description` block.
pub fn write_metadata<'a, I>(entities: I) -> String
where
    I: IntoIterator<Item = &'a dyn Describable>,
{
    let mut rdf = XmlElement::new(Some(namespace::RDF), Some(prefix::RDF), "RDF");
    rdf.declare_namespace(prefix::RDF, namespace::RDF);
    rdf.declare_namespace(prefix::DCTERMS, namespace::DCTERMS);
    rdf.declare_namespace(prefix::VCARD, namespace::VCARD);

    for entity in entities {
        for description in entity.descriptions() {
            rdf.push_child(description.to_description());
        }
    }
    rdf.to_document()
}

/// Whether any of `entities` has a description to write.
pub fn has_descriptions<'a, I>(entities: I) -> bool
where
    I: IntoIterator<Item = &'a dyn Describable>,
{
    entities.into_iter().any(|e| !e.descriptions().is_empty())
}
