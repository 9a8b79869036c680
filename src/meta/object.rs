//! Metadata objects: one description of one entity (or fragment of one).

use super::omex::OmexDescription;
use crate::archive::constants::{namespace, prefix};
use crate::archive::entry::EntryId;
use crate::common::xml::{XmlElement, XmlNode};

/// Identity of something that can be described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    /// The archive itself (`.`)
    Archive,
    /// The metadata documents of the archive (meta-of-meta)
    MetaDataFile,
    /// A content entry
    Entry(EntryId),
}

/// Back-reference from a description to the entity it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct About {
    pub entity: EntityId,
    pub entity_path: String,
}

/// Payload kinds of a [`MetaDataObject`].
#[derive(Debug, Clone)]
pub enum MetaDataPayload {
    /// Structured OMEX description
    Omex(OmexDescription),
    /// Any other description, kept verbatim as its `rdf:Description` element
    Default(XmlElement),
}

/// A parser trying to read a payload from an `rdf:Description` element.
pub type PayloadParser = fn(&XmlElement) -> Option<MetaDataPayload>;

/// Payload parsers in priority order. The last one always succeeds.
pub const PAYLOAD_PARSERS: &[PayloadParser] = &[try_parse_omex, try_parse_default];

fn try_parse_omex(element: &XmlElement) -> Option<MetaDataPayload> {
    OmexDescription::try_parse(element).map(MetaDataPayload::Omex)
}

fn try_parse_default(element: &XmlElement) -> Option<MetaDataPayload> {
    Some(MetaDataPayload::Default(element.clone()))
}

impl MetaDataPayload {
    /// Pick the first payload kind that accepts `element`.
    pub fn parse(element: &XmlElement) -> Self {
        PAYLOAD_PARSERS
            .iter()
            .find_map(|parse| parse(element))
            .unwrap_or_else(|| MetaDataPayload::Default(element.clone()))
    }

    /// Append the payload to an `rdf:Description` element.
    pub fn write_into(&self, parent: &mut XmlElement) {
        match self {
            MetaDataPayload::Omex(description) => description.write_into(parent),
            MetaDataPayload::Default(element) => {
                parent.children.extend(element.children.iter().cloned());
            },
        }
    }

    /// Prefix-independent serialized form, used to compare payloads.
    pub fn canonical(&self) -> String {
        let mut holder = description_element();
        self.write_into(&mut holder);
        holder
            .children
            .iter()
            .map(|child| match child {
                XmlNode::Element(e) => e.canonical(),
                XmlNode::Text(t) => t.clone(),
            })
            .collect()
    }
}

fn description_element() -> XmlElement {
    XmlElement::new(Some(namespace::RDF), Some(prefix::RDF), "Description")
}

/// One description attached to an entity.
///
/// The object does not own its entity; it only remembers its id and path
/// so it can be written back out. Two objects are equal when they describe
/// the same entity path and fragment and their payloads serialize to the
/// same XML.
#[derive(Debug, Clone)]
pub struct MetaDataObject {
    about: Option<About>,
    fragment: Option<String>,
    payload: MetaDataPayload,
}

impl MetaDataObject {
    /// Create a detached object.
    pub fn new(payload: MetaDataPayload) -> Self {
        Self {
            about: None,
            fragment: None,
            payload,
        }
    }

    pub fn omex(description: OmexDescription) -> Self {
        Self::new(MetaDataPayload::Omex(description))
    }

    /// Create an object from a `rdf:Description` element, choosing the
    /// payload kind.
    pub fn from_description(element: &XmlElement) -> Self {
        Self::new(MetaDataPayload::parse(element))
    }

    /// Point the object at an entity.
    pub fn set_about(&mut self, entity: EntityId, entity_path: &str, fragment: Option<&str>) {
        self.about = Some(About {
            entity,
            entity_path: entity_path.to_string(),
        });
        self.fragment = fragment.map(str::to_string);
    }

    /// The entity this object is attached to.
    pub fn about(&self) -> Option<&About> {
        self.about.as_ref()
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.about.as_ref().map(|a| a.entity)
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The `rdf:about` value: `path` or `path#fragment`.
    pub fn about_string(&self) -> String {
        let path = self
            .about
            .as_ref()
            .map(|a| a.entity_path.as_str())
            .unwrap_or_default();
        match &self.fragment {
            Some(fragment) => format!("{}#{}", path, fragment),
            None => path.to_string(),
        }
    }

    pub fn payload(&self) -> &MetaDataPayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut MetaDataPayload {
        &mut self.payload
    }

    /// The OMEX description, if this is an OMEX object.
    pub fn omex_description(&self) -> Option<&OmexDescription> {
        match &self.payload {
            MetaDataPayload::Omex(description) => Some(description),
            MetaDataPayload::Default(_) => None,
        }
    }

    /// Build the `rdf:Description` element for a metadata document.
    pub fn to_description(&self) -> XmlElement {
        let mut element = description_element().with_attribute(
            Some(namespace::RDF),
            Some(prefix::RDF),
            "about",
            &self.about_string(),
        );
        self.payload.write_into(&mut element);
        element
    }
}

impl PartialEq for MetaDataObject {
    fn eq(&self, other: &Self) -> bool {
        let path = |o: &Self| o.about.as_ref().map(|a| a.entity_path.clone());
        path(self) == path(other)
            && self.fragment == other.fragment
            && self.payload.canonical() == other.payload.canonical()
    }
}

impl Eq for MetaDataObject {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::vcard::VCard;
    use chrono::{TimeZone, Utc};

    fn omex_object() -> MetaDataObject {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        MetaDataObject::omex(OmexDescription::new(VCard::new("Doe", "Jane", "", ""), created))
    }

    #[test]
    fn test_about_string() {
        let mut object = omex_object();
        assert_eq!(object.about_string(), "");
        object.set_about(EntityId::Archive, ".", None);
        assert_eq!(object.about_string(), ".");
        object.set_about(EntityId::Archive, "/a.txt", Some("frag1"));
        assert_eq!(object.about_string(), "/a.txt#frag1");
    }

    #[test]
    fn test_equality_uses_path_fragment_and_payload() {
        let mut a = omex_object();
        let mut b = omex_object();
        a.set_about(EntityId::Archive, "/a.txt", None);
        b.set_about(EntityId::MetaDataFile, "/a.txt", None);
        assert_eq!(a, b);

        b.set_about(EntityId::Archive, "/a.txt", Some("x"));
        assert_ne!(a, b);

        let mut c = MetaDataObject::omex(
            OmexDescription::default().with_description("other"),
        );
        c.set_about(EntityId::Archive, "/a.txt", None);
        assert_ne!(a, c);
    }

    #[test]
    fn test_payload_selection() {
        let omex = omex_object().to_description();
        assert!(matches!(MetaDataPayload::parse(&omex), MetaDataPayload::Omex(_)));

        let foreign = XmlElement::parse(
            r#"<rdf:Description xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                 xmlns:bqbiol="http://biomodels.net/biology-qualifiers/" rdf:about="/m.xml">
                 <bqbiol:is rdf:resource="urn:miriam:taxonomy:9606"/>
               </rdf:Description>"#,
        )
        .unwrap();
        let payload = MetaDataPayload::parse(&foreign);
        assert!(matches!(payload, MetaDataPayload::Default(_)));

        let mut object = MetaDataObject::new(payload);
        object.set_about(EntityId::Archive, "/m.xml", None);
        let reparsed = MetaDataObject::from_description(&object.to_description());
        assert!(matches!(reparsed.payload(), MetaDataPayload::Default(_)));
        assert_eq!(reparsed.payload().canonical(), object.payload().canonical());
    }
}
