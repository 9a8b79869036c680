//! Creator records of OMEX descriptions.

use super::parse_type_resource;
use crate::archive::constants::{namespace, prefix};
use crate::common::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// A person who contributed to an archive or one of its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VCard {
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// E-mail address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl VCard {
    pub fn new(family_name: &str, given_name: &str, email: &str, organization: &str) -> Self {
        let field = |v: &str| (!v.is_empty()).then(|| v.to_string());
        Self {
            family_name: field(family_name),
            given_name: field(given_name),
            email: field(email),
            organization: field(organization),
        }
    }

    /// A card is empty when it names nobody and has no e-mail address.
    pub fn is_empty(&self) -> bool {
        non_empty(&self.family_name).is_none()
            && non_empty(&self.given_name).is_none()
            && non_empty(&self.email).is_none()
    }

    /// Read a card from a `dcterms:creator` element.
    pub fn from_xml(creator: &XmlElement) -> Self {
        let text = |local: &str| {
            creator
                .first_descendant(Some(namespace::VCARD), local)
                .map(|e| e.text().trim().to_string())
                .filter(|t| !t.is_empty())
        };
        Self {
            family_name: text("family-name"),
            given_name: text("given-name"),
            email: text("email"),
            organization: text("organization-name"),
        }
    }

    /// Build the `dcterms:creator` element, or `None` for an empty card.
    pub fn to_xml(&self) -> Option<XmlElement> {
        if self.is_empty() {
            return None;
        }
        let vcard = |local: &str| XmlElement::new(Some(namespace::VCARD), Some(prefix::VCARD), local);

        let mut li = parse_type_resource(XmlElement::new(
            Some(namespace::RDF),
            Some(prefix::RDF),
            "li",
        ));

        if non_empty(&self.family_name).is_some() || non_empty(&self.given_name).is_some() {
            let mut n = parse_type_resource(vcard("n"));
            if let Some(family) = non_empty(&self.family_name) {
                n.push_child(vcard("family-name").with_text(family));
            }
            if let Some(given) = non_empty(&self.given_name) {
                n.push_child(vcard("given-name").with_text(given));
            }
            li.push_child(n);
        }
        if let Some(email) = non_empty(&self.email) {
            li.push_child(vcard("email").with_text(email));
        }
        if let Some(organization) = non_empty(&self.organization) {
            li.push_child(
                parse_type_resource(vcard("org"))
                    .with_child(vcard("organization-name").with_text(organization)),
            );
        }

        let bag = XmlElement::new(Some(namespace::RDF), Some(prefix::RDF), "Bag").with_child(li);
        Some(
            XmlElement::new(Some(namespace::DCTERMS), Some(prefix::DCTERMS), "creator")
                .with_child(bag),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_card() {
        assert!(VCard::default().is_empty());
        assert!(VCard::new("", "", "", "Uni").is_empty());
        assert!(VCard::new("", "", "", "Uni").to_xml().is_none());
        assert!(!VCard::new("", "", "a@b.c", "").is_empty());
        assert!(!VCard::new("Doe", "", "", "").is_empty());
    }

    #[test]
    fn test_xml_roundtrip() {
        let card = VCard::new("Doe", "Jane", "jane@example.org", "Example Lab");
        let element = card.to_xml().unwrap();
        assert!(element.is(Some(namespace::DCTERMS), "creator"));
        assert_eq!(VCard::from_xml(&element), card);

        let partial = VCard::new("", "Jane", "", "");
        let element = partial.to_xml().unwrap();
        assert!(element.first_descendant(Some(namespace::VCARD), "family-name").is_none());
        assert_eq!(VCard::from_xml(&element), partial);
    }
}
