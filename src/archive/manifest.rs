//! OMEX manifest parsing and generation.
//!
//! The manifest (`/manifest.xml`) lists every file of the archive with its
//! format URI and a `master` flag for main entries. Rows for the archive
//! itself and for the manifest carry special format URIs and are not
//! entries; rows with the metadata format name metadata documents.

use super::constants::{format, location, namespace};
use super::formats::format_uri;
use super::path::EntryPath;
use crate::common::xml::{XmlElement, escape_xml};
use crate::common::{Error, ErrorLog, Result};
use url::Url;

/// A content row of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: EntryPath,
    pub format: Url,
    pub main: bool,
}

/// Result of decoding a manifest.
#[derive(Debug, Clone, Default)]
pub struct DecodedManifest {
    pub entries: Vec<ManifestEntry>,
    pub metadata_files: Vec<EntryPath>,
}

/// Whether a `master` attribute value means "main entry".
fn is_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Decode a manifest document.
///
/// `exists` reports whether a normalized path is present in the container.
/// Rows that cannot be used are reported through `errors` and skipped in
/// lenient mode; in strict mode the first problem is returned.
pub fn decode<F>(document: &str, exists: F, errors: &mut ErrorLog) -> Result<DecodedManifest>
where
    F: Fn(&EntryPath) -> bool,
{
    let root = XmlElement::parse(document)
        .map_err(|e| Error::XmlError(format!("cannot read manifest of archive: {}", e)));
    let root = match root {
        Ok(root) => root,
        Err(e) => {
            errors.record(e)?;
            return Ok(DecodedManifest::default());
        },
    };

    let mut decoded = DecodedManifest::default();
    let content_rows = root.descendants(Some(namespace::MANIFEST), "content");

    for (index, content) in content_rows.into_iter().enumerate() {
        let missing = |attribute| Error::MissingAttribute {
            document: location::MANIFEST.to_string(),
            element: "content",
            index,
            attribute,
        };

        let Some(location) = content.attribute(None, "location") else {
            errors.record(missing("location"))?;
            continue;
        };
        let Some(format) = content.attribute(None, "format") else {
            errors.record(missing("format"))?;
            continue;
        };

        let uri = match format_uri(location, format) {
            Ok(uri) => uri,
            Err(e) => {
                errors.record(e)?;
                continue;
            },
        };
        if uri.as_str() == format::OMEX || uri.as_str() == format::MANIFEST {
            continue;
        }

        let path = EntryPath::new(location);
        if path.is_root() {
            errors.record(Error::InvalidPath(format!(
                "content {} in {} points at the archive root ({})",
                index,
                location::MANIFEST,
                location
            )))?;
            continue;
        }
        if !exists(&path) {
            errors.record(Error::FileNotFound(path.to_string()))?;
            continue;
        }

        if uri.as_str() == format::METADATA {
            if !decoded.metadata_files.contains(&path) {
                decoded.metadata_files.push(path);
            }
            continue;
        }

        let main = content.attribute(None, "master").is_some_and(is_truthy);
        decoded.entries.push(ManifestEntry {
            path,
            format: uri,
            main,
        });
    }

    log::debug!(
        "manifest lists {} entries and {} metadata files",
        decoded.entries.len(),
        decoded.metadata_files.len()
    );
    Ok(decoded)
}

/// Generate the manifest document.
///
/// Rows are written for the archive itself, the manifest, every entry and
/// every metadata document, in that order.
pub fn encode<'a, E, M>(entries: E, metadata_files: M) -> String
where
    E: IntoIterator<Item = (&'a EntryPath, &'a Url, bool)>,
    M: IntoIterator<Item = &'a EntryPath>,
{
    let mut manifest = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<omexManifest xmlns="{}">
"#,
        namespace::MANIFEST
    );

    let mut push_row = |location: &str, format: &str, master: Option<bool>| {
        manifest.push_str(&format!(
            r#"  <content location="{}" format="{}""#,
            escape_xml(location),
            escape_xml(format)
        ));
        if let Some(master) = master {
            manifest.push_str(&format!(r#" master="{}""#, master));
        }
        manifest.push_str("/>\n");
    };

    push_row(location::ARCHIVE, format::OMEX, None);
    push_row(
        &EntryPath::new(location::MANIFEST).manifest_location(),
        format::MANIFEST,
        None,
    );
    for (path, format, main) in entries {
        push_row(&path.manifest_location(), format.as_str(), Some(main));
    }
    for path in metadata_files {
        push_row(&path.manifest_location(), format::METADATA, None);
    }

    manifest.push_str("</omexManifest>\n");
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content location="." format="http://identifiers.org/combine.specifications/omex"/>
  <content location="./manifest.xml" format="http://identifiers.org/combine.specifications/omex-manifest"/>
  <content location="./model.xml" format="http://identifiers.org/combine.specifications/sbml" master="true"/>
  <content location="data/table.csv" format="text/csv" master="false"/>
  <content location="./metadata.rdf" format="http://identifiers.org/combine.specifications/omex-metadata"/>
</omexManifest>"#;

    fn all_exist(_: &EntryPath) -> bool {
        true
    }

    #[test]
    fn test_decode() {
        let mut errors = ErrorLog::new(false);
        let decoded = decode(MANIFEST, all_exist, &mut errors).unwrap();

        assert_eq!(decoded.entries.len(), 2);
        let model = &decoded.entries[0];
        assert_eq!(model.path.as_str(), "/model.xml");
        assert!(model.main);

        let table = &decoded.entries[1];
        assert_eq!(table.path.as_str(), "/data/table.csv");
        assert_eq!(table.format.as_str(), "http://purl.org/NET/mediatypes/text/csv");
        assert!(!table.main);

        assert_eq!(decoded.metadata_files, vec![EntryPath::new("/metadata.rdf")]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_decode_missing_file() {
        let only_model = |p: &EntryPath| p.as_str() != "/data/table.csv";

        let mut strict = ErrorLog::new(false);
        let err = decode(MANIFEST, only_model, &mut strict).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(ref p) if p == "/data/table.csv"));

        let mut lenient = ErrorLog::new(true);
        let decoded = decode(MANIFEST, only_model, &mut lenient).unwrap();
        assert_eq!(decoded.entries.len(), 1);
        assert_eq!(lenient.errors().len(), 1);
    }

    #[test]
    fn test_decode_bad_rows() {
        let manifest = r#"<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content format="text/plain"/>
  <content location="./a.txt"/>
  <content location="./b.txt" format="not a uri"/>
  <content location="./c.txt" format="text/plain" master="TRUE"/>
</omexManifest>"#;
        let mut lenient = ErrorLog::new(true);
        let decoded = decode(manifest, all_exist, &mut lenient).unwrap();
        assert_eq!(decoded.entries.len(), 1);
        assert!(decoded.entries[0].main);

        let errors = lenient.errors();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("`location`"));
        assert!(errors[1].contains("`format`"));
        assert!(errors[2].contains("is not a valid URI"));
    }

    #[test]
    fn test_decode_root_location() {
        let manifest = r#"<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content location="." format="http://identifiers.org/combine.specifications/omex"/>
  <content location="./" format="text/plain"/>
  <content location="./a.txt" format="text/plain"/>
</omexManifest>"#;

        let mut strict = ErrorLog::new(false);
        let err = decode(manifest, all_exist, &mut strict).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));

        let mut lenient = ErrorLog::new(true);
        let decoded = decode(manifest, all_exist, &mut lenient).unwrap();
        assert_eq!(decoded.entries.len(), 1);
        assert_eq!(lenient.errors().len(), 1);
        assert!(lenient.errors()[0].contains("archive root"));
    }

    #[test]
    fn test_decode_ignores_foreign_namespace() {
        let manifest = r#"<omexManifest><content location="./a.txt" format="text/plain"/></omexManifest>"#;
        let mut errors = ErrorLog::new(false);
        let decoded = decode(manifest, all_exist, &mut errors).unwrap();
        assert!(decoded.entries.is_empty());
    }

    #[test]
    fn test_encode_decode() {
        let model = EntryPath::new("model.xml");
        let odd = EntryPath::new("a&b.txt");
        let sbml = Url::parse("http://identifiers.org/combine.specifications/sbml").unwrap();
        let text = Url::parse("http://purl.org/NET/mediatypes/text/plain").unwrap();
        let metadata = EntryPath::new("metadata.rdf");

        let xml = encode(
            vec![(&model, &sbml, true), (&odd, &text, false)],
            vec![&metadata],
        );
        assert!(xml.contains(r#"<content location="." format="http://identifiers.org/combine.specifications/omex"/>"#));
        assert!(xml.contains(r#"location="./manifest.xml""#));
        assert!(xml.contains(r#"location="./model.xml" format="http://identifiers.org/combine.specifications/sbml" master="true""#));
        assert!(xml.contains(r#"location="./a&amp;b.txt""#));

        let mut errors = ErrorLog::new(false);
        let decoded = decode(&xml, all_exist, &mut errors).unwrap();
        assert_eq!(decoded.entries.len(), 2);
        assert_eq!(decoded.entries[1].path.as_str(), "/a&b.txt");
        assert!(decoded.entries[0].main && !decoded.entries[1].main);
        assert_eq!(decoded.metadata_files, vec![metadata]);
    }
}
