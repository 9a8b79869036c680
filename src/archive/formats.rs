//! Format identifiers.
//!
//! Every entry carries a format URI. Manifests written by other tools
//! sometimes use bare MIME types instead, and API callers often prefer short
//! names such as `sbml` or `pdf`. This module turns both into URIs.

use super::constants::format;
use crate::common::{Error, Result};
use phf::phf_map;
use std::collections::BTreeMap;
use url::Url;

const SPECIFICATIONS: &str = "http://identifiers.org/combine.specifications/";

/// Well-known COMBINE formats, keyed by lowercase short name.
static KNOWN_FORMATS: phf::Map<&'static str, &'static str> = phf_map! {
    // Archive internals
    "omex" => "http://identifiers.org/combine.specifications/omex",
    "manifest" => "http://identifiers.org/combine.specifications/omex-manifest",
    "metadata" => "http://identifiers.org/combine.specifications/omex-metadata",
    // Modelling standards
    "sbml" => "http://identifiers.org/combine.specifications/sbml",
    "sbml.level-2.version-4" => "http://identifiers.org/combine.specifications/sbml.level-2.version-4",
    "sbml.level-3.version-1" => "http://identifiers.org/combine.specifications/sbml.level-3.version-1",
    "sbml.level-3.version-2" => "http://identifiers.org/combine.specifications/sbml.level-3.version-2",
    "cellml" => "http://identifiers.org/combine.specifications/cellml",
    "cellml.1.0" => "http://identifiers.org/combine.specifications/cellml.1.0",
    "cellml.1.1" => "http://identifiers.org/combine.specifications/cellml.1.1",
    "sed-ml" => "http://identifiers.org/combine.specifications/sed-ml",
    "sed-ml.level-1.version-1" => "http://identifiers.org/combine.specifications/sed-ml.level-1.version-1",
    "sed-ml.level-1.version-2" => "http://identifiers.org/combine.specifications/sed-ml.level-1.version-2",
    "sbgn" => "http://identifiers.org/combine.specifications/sbgn",
    "sbgn.pd" => "http://identifiers.org/combine.specifications/sbgn.pd",
    "sbol" => "http://identifiers.org/combine.specifications/sbol",
    "biopax" => "http://identifiers.org/combine.specifications/biopax",
    "numl" => "http://identifiers.org/combine.specifications/numl",
    "neuroml" => "http://identifiers.org/combine.specifications/neuroml",
    // Generic media types
    "pdf" => "http://purl.org/NET/mediatypes/application/pdf",
    "csv" => "http://purl.org/NET/mediatypes/text/csv",
    "txt" => "http://purl.org/NET/mediatypes/text/plain",
    "html" => "http://purl.org/NET/mediatypes/text/html",
    "xml" => "http://purl.org/NET/mediatypes/application/xml",
    "rdf" => "http://purl.org/NET/mediatypes/application/rdf+xml",
    "json" => "http://purl.org/NET/mediatypes/application/json",
    "zip" => "http://purl.org/NET/mediatypes/application/zip",
    "png" => "http://purl.org/NET/mediatypes/image/png",
    "jpg" => "http://purl.org/NET/mediatypes/image/jpeg",
    "jpeg" => "http://purl.org/NET/mediatypes/image/jpeg",
    "svg" => "http://purl.org/NET/mediatypes/image/svg+xml",
};

/// Mapping between short format names and format URIs.
///
/// The registry is a plain value: build it once (usually from
/// [`FormatRegistry::default`]) and hand it to the archive through
/// [`ArchiveOptions`](super::ArchiveOptions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    formats: BTreeMap<String, String>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self {
            formats: KNOWN_FORMATS
                .entries()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    /// Get the format URI registered for `name`, or `name` itself.
    ///
    /// Keys are matched case-insensitively.
    pub fn lookup<'a>(&'a self, name: &'a str) -> &'a str {
        self.formats
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Get the short name registered for `uri`, or `uri` itself when it is
    /// unknown or registered under more than one name.
    pub fn short_name<'a>(&'a self, uri: &'a str) -> &'a str {
        let mut names = self
            .formats
            .iter()
            .filter(|(_, v)| v.as_str() == uri)
            .map(|(k, _)| k.as_str());
        match (names.next(), names.next()) {
            (Some(name), None) => name,
            _ => uri,
        }
    }

    /// Register `uri` under `name`, returning the previous URI.
    pub fn insert(&mut self, name: &str, uri: &str) -> Option<String> {
        self.formats.insert(name.to_lowercase(), uri.to_string())
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Resolve a short name, URI or MIME type into a format URI.
    pub fn resolve(&self, name: &str) -> Result<Url> {
        format_uri(name, self.lookup(name))
    }

    /// Build a registry from a properties table.
    ///
    /// Each non-blank line holds `key=value` or `key: value`. Lines starting
    /// with `#` or `!` are comments, and `\` escapes the next character
    /// (`\:` inside a URI, `\n`, `\t`).
    pub fn from_properties(text: &str) -> Self {
        let mut registry = Self::empty();
        registry.extend_from_properties(text);
        registry
    }

    /// Add every mapping of a properties table, overriding existing keys.
    pub fn extend_from_properties(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = split_property(line)
                && !key.is_empty()
            {
                self.insert(&key, &value);
            }
        }
    }
}

/// Split a property line at the first unescaped `=` or `:` and unescape both
/// halves.
fn split_property(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars();
    let mut escaped = false;
    let mut found = false;

    for c in chars.by_ref() {
        if escaped {
            key.push(unescape_char(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' {
            found = true;
            break;
        } else {
            key.push(c);
        }
    }
    if !found {
        return None;
    }

    let mut value = String::new();
    escaped = false;
    for c in chars.as_str().trim().chars() {
        if escaped {
            value.push(unescape_char(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            value.push(c);
        }
    }
    Some((key.trim().to_string(), value))
}

fn unescape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Whether `format` looks like a bare MIME type (`type/subtype`).
fn is_mime_type(format: &str) -> bool {
    fn is_token(s: &str) -> bool {
        !s.is_empty()
            && s.bytes().all(|b| {
                b.is_ascii_alphanumeric()
                    || matches!(b, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_' | b'.' | b'+')
            })
    }
    match format.split_once('/') {
        Some((kind, subtype)) => is_token(kind) && is_token(subtype),
        None => false,
    }
}

/// Turn the format string of `location` into a URI.
///
/// Absolute URIs are taken as they are, MIME types are mapped into the
/// `http://purl.org/NET/mediatypes/` namespace, anything else is an
/// [`Error::InvalidFormatUri`].
pub fn format_uri(location: &str, format: &str) -> Result<Url> {
    let invalid = || Error::InvalidFormatUri {
        location: location.to_string(),
        format: format.to_string(),
    };

    let trimmed = format.trim();
    if let Ok(url) = Url::parse(trimmed) {
        return Ok(url);
    }
    if is_mime_type(trimmed) {
        return Url::parse(&format!("{}{}", format::MEDIATYPES, trimmed)).map_err(|_| invalid());
    }
    Err(invalid())
}

/// Format URI for a specification under `http://identifiers.org/combine.specifications/`.
pub fn specification(name: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}{}", SPECIFICATIONS, name))?)
}
