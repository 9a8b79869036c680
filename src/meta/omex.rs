//! OMEX descriptions: free text, creators and creation/modification dates.
//!
//! An OMEX description is serialized with Dublin Core terms inside an
//! `rdf:Description` block:
//!
//! ```xml
//! <rdf:Description rdf:about="/model.xml">
//!   <dcterms:description>A model</dcterms:description>
//!   <dcterms:creator>
//!     <rdf:Bag>
//!       <rdf:li rdf:parseType="Resource">
//!         <vCard:n rdf:parseType="Resource">
//!           <vCard:family-name>Doe</vCard:family-name>
//!           <vCard:given-name>Jane</vCard:given-name>
//!         </vCard:n>
//!       </rdf:li>
//!     </rdf:Bag>
//!   </dcterms:creator>
//!   <dcterms:created rdf:parseType="Resource">
//!     <dcterms:W3CDTF>2024-01-01T00:00:00Z</dcterms:W3CDTF>
//!   </dcterms:created>
//! </rdf:Description>
//! ```

use super::parse_type_resource;
use super::vcard::VCard;
use crate::archive::constants::{DATE_FORMAT, namespace, prefix};
use crate::common::xml::XmlElement;
use crate::common::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured description of an archive, an entry or a fragment of one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmexDescription {
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// People who created the described entity
    #[serde(default)]
    pub creators: Vec<VCard>,
    /// Creation date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Modification dates, oldest first
    #[serde(default)]
    pub modified: Vec<DateTime<Utc>>,
}

impl OmexDescription {
    /// Create a description with one creator, created now.
    pub fn new(creator: VCard, created: DateTime<Utc>) -> Self {
        Self {
            description: None,
            creators: vec![creator],
            created: Some(created),
            modified: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_creator(mut self, creator: VCard) -> Self {
        self.creators.push(creator);
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified.push(modified);
        self
    }

    /// A description is empty unless it has text, a non-empty creator or a
    /// creation date.
    pub fn is_empty(&self) -> bool {
        let has_text = self.description.as_deref().is_some_and(|d| !d.is_empty());
        let has_creator = self.creators.iter().any(|c| !c.is_empty());
        !(has_text || has_creator || self.created.is_some())
    }

    /// Read an OMEX description from an `rdf:Description` element.
    ///
    /// Returns `None` when the element is not OMEX-shaped or describes
    /// nothing, so that callers can fall back to another payload kind.
    pub fn try_parse(element: &XmlElement) -> Option<Self> {
        match Self::from_xml(element) {
            Ok(description) if !description.is_empty() => Some(description),
            Ok(_) => None,
            Err(e) => {
                log::debug!("not an OMEX description: {}", e);
                None
            },
        }
    }

    /// Read the Dublin Core terms of an `rdf:Description` element.
    pub fn from_xml(element: &XmlElement) -> Result<Self> {
        let dc = Some(namespace::DCTERMS);

        let description = element
            .first_descendant(dc, "description")
            .map(|e| e.text());

        let creators = element
            .descendants(dc, "creator")
            .into_iter()
            .map(VCard::from_xml)
            .collect();

        let created = element
            .first_descendant(dc, "created")
            .and_then(|c| c.first_descendant(dc, "W3CDTF"))
            .map(|d| parse_date(&d.text()))
            .transpose()?;

        let modified = element
            .descendants(dc, "modified")
            .into_iter()
            .filter_map(|m| m.first_descendant(dc, "W3CDTF"))
            .map(|d| parse_date(&d.text()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            description,
            creators,
            created,
            modified,
        })
    }

    /// Append the Dublin Core terms of this description to `parent`.
    ///
    /// Without modification dates the creation date is written as the only
    /// modification.
    pub fn write_into(&self, parent: &mut XmlElement) {
        if let Some(text) = self.description.as_deref().filter(|d| !d.is_empty()) {
            parent.push_child(dcterms("description").with_text(text));
        }
        for creator in &self.creators {
            if let Some(element) = creator.to_xml() {
                parent.push_child(element);
            }
        }
        if let Some(created) = &self.created {
            parent.push_child(date_element("created", created));
        }
        if self.modified.is_empty() {
            if let Some(created) = &self.created {
                parent.push_child(date_element("modified", created));
            }
        } else {
            for modified in &self.modified {
                parent.push_child(date_element("modified", modified));
            }
        }
    }

    /// Export as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from JSON produced by [`OmexDescription::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn dcterms(local: &str) -> XmlElement {
    XmlElement::new(Some(namespace::DCTERMS), Some(prefix::DCTERMS), local)
}

fn date_element(local: &str, date: &DateTime<Utc>) -> XmlElement {
    parse_type_resource(dcterms(local))
        .with_child(dcterms("W3CDTF").with_text(&format_date(date)))
}

/// Format a timestamp as W3CDTF with second precision.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a W3CDTF timestamp.
///
/// Accepts the `YYYY-MM-DDThh:mm:ssZ` form written by this crate and any
/// RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATE_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::DateParse(format!("{}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> OmexDescription {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        OmexDescription::new(VCard::new("Doe", "Jane", "jane@example.org", "Lab"), created)
            .with_description("a & b <model>")
    }

    fn description_element() -> XmlElement {
        XmlElement::new(Some(namespace::RDF), Some(prefix::RDF), "Description")
    }

    #[test]
    fn test_is_empty() {
        assert!(OmexDescription::default().is_empty());
        let mut only_creator = OmexDescription::default();
        only_creator.creators.push(VCard::new("Doe", "", "", ""));
        assert!(!only_creator.is_empty());
        let only_text = OmexDescription::default().with_description("text");
        assert!(!only_text.is_empty());
        let empty_creator = OmexDescription::default().with_creator(VCard::default());
        assert!(empty_creator.is_empty());
    }

    #[test]
    fn test_xml_roundtrip_adds_modified() {
        let original = sample();
        let mut element = description_element();
        original.write_into(&mut element);

        let parsed = OmexDescription::try_parse(&element).unwrap();
        assert_eq!(parsed.description, original.description);
        assert_eq!(parsed.creators, original.creators);
        assert_eq!(parsed.created, original.created);
        // the creation date stands in for the missing modification date
        assert_eq!(parsed.modified, vec![original.created.unwrap()]);

        let mut again = description_element();
        parsed.write_into(&mut again);
        assert_eq!(again.canonical(), element.canonical());
    }

    #[test]
    fn test_try_parse_rejects_vacuous_and_malformed() {
        let vacuous = description_element().with_child(dcterms("description"));
        assert!(OmexDescription::try_parse(&vacuous).is_none());

        let bad_date = description_element().with_child(
            dcterms("created").with_child(dcterms("W3CDTF").with_text("yesterday")),
        );
        assert!(OmexDescription::from_xml(&bad_date).is_err());
        assert!(OmexDescription::try_parse(&bad_date).is_none());
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2013, 11, 5, 9, 30, 0).unwrap();
        assert_eq!(parse_date("2013-11-05T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_date("2013-11-05T10:30:00+01:00").unwrap(), expected);
        assert!(parse_date("05.11.2013").is_err());
        assert_eq!(format_date(&expected), "2013-11-05T09:30:00Z");
    }

    #[test]
    fn test_json_roundtrip() {
        let original = sample().with_modified(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        let json = original.to_json().unwrap();
        assert!(json.contains("\"family_name\": \"Doe\""));
        assert_eq!(OmexDescription::from_json(&json).unwrap(), original);
    }
}
