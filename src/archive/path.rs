//! Provides the EntryPath value type, the normalized location of an entry.
//!
//! Manifests and metadata documents refer to the same file in different ways
//! (`./model.xml`, `model.xml`, `/model.xml`). Every location is run through
//! [`EntryPath::normalize`] before it is used as a key, so all of them name
//! the same entry.

use super::constants::location;
use std::borrow::Borrow;
use std::fmt;

/// An absolute, lexically normalized location inside an archive.
///
/// EntryPaths always begin with a forward slash, contain no `.` or empty
/// segments, and never climb above the root. Backslashes and case are kept
/// as they are.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPath {
    path: String,
}

impl EntryPath {
    /// Normalize `location` into an EntryPath.
    pub fn new(location: &str) -> Self {
        Self {
            path: Self::normalize(location),
        }
    }

    /// Normalize a location.
    ///
    /// Strips one leading `./`, prepends `/` when missing, drops empty and
    /// `.` segments and resolves `..` against the preceding segment. A `..`
    /// at the root is discarded.
    pub fn normalize(location: &str) -> String {
        let location = location.strip_prefix("./").unwrap_or(location);

        let mut parts: Vec<&str> = Vec::new();
        for part in location.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        let mut normalized = String::with_capacity(location.len() + 1);
        for part in &parts {
            normalized.push('/');
            normalized.push_str(part);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        normalized
    }

    /// The normalized path string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Whether this is the container root `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Get the filename portion, e.g. `model.xml` for `/sub/model.xml`.
    ///
    /// Empty for the root.
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[pos + 1..],
            None => "",
        }
    }

    /// Get the extension without the leading period, or `""`.
    pub fn extension(&self) -> &str {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(pos) if pos > 0 => &file_name[pos + 1..],
            _ => "",
        }
    }

    /// Get the directory portion, e.g. `/sub` for `/sub/model.xml`.
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.path[..pos],
        }
    }

    /// Get the ZIP member name (path with the leading slash stripped).
    pub fn member_name(&self) -> &str {
        &self.path[1..]
    }

    /// Get the manifest form `./<member name>`.
    pub fn manifest_location(&self) -> String {
        format!("./{}", self.member_name())
    }

    /// Index of a generated metadata document.
    ///
    /// Returns `Some(0)` for `/metadata.rdf`, `Some(n)` for
    /// `/metadata-<n>.rdf`, and `None` for every other path.
    pub fn metadata_index(&self) -> Option<u64> {
        if self.path == location::METADATA {
            return Some(0);
        }
        let digits = self
            .path
            .strip_prefix('/')?
            .strip_prefix(location::METADATA_PREFIX)?
            .strip_suffix(location::METADATA_SUFFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Whether the path names the manifest or a generated metadata document.
    pub fn is_reserved(&self) -> bool {
        self.path == location::MANIFEST || self.metadata_index().is_some()
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl Borrow<str> for EntryPath {
    fn borrow(&self) -> &str {
        &self.path
    }
}

impl From<&str> for EntryPath {
    fn from(location: &str) -> Self {
        Self::new(location)
    }
}

impl From<&String> for EntryPath {
    fn from(location: &String) -> Self {
        Self::new(location)
    }
}

impl From<String> for EntryPath {
    fn from(location: String) -> Self {
        Self::new(&location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("./a/b", "/a/b")]
    #[case("a/b", "/a/b")]
    #[case("/a/b", "/a/b")]
    #[case("/a/./b", "/a/b")]
    #[case("/a//b/", "/a/b")]
    #[case("/a/c/../b", "/a/b")]
    #[case("../../a", "/a")]
    #[case(".", "/")]
    #[case("./", "/")]
    #[case("", "/")]
    #[case("/", "/")]
    #[case("a\\b", "/a\\b")]
    #[case("Sub/Model.XML", "/Sub/Model.XML")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(EntryPath::normalize(input), expected);
    }

    #[test]
    fn test_components() {
        let path = EntryPath::new("./sub/model.xml");
        assert_eq!(path.file_name(), "model.xml");
        assert_eq!(path.extension(), "xml");
        assert_eq!(path.parent(), "/sub");
        assert_eq!(path.member_name(), "sub/model.xml");
        assert_eq!(path.manifest_location(), "./sub/model.xml");

        let top = EntryPath::new("a.txt");
        assert_eq!(top.parent(), "/");

        let hidden = EntryPath::new(".hidden");
        assert_eq!(hidden.extension(), "");

        let root = EntryPath::new("/");
        assert!(root.is_root());
        assert_eq!(root.file_name(), "");
        assert_eq!(root.member_name(), "");
    }

    #[rstest]
    #[case("/manifest.xml", true)]
    #[case("manifest.xml", true)]
    #[case("/metadata.rdf", true)]
    #[case("/metadata-1.rdf", true)]
    #[case("./metadata-123.rdf", true)]
    #[case("/metadata-.rdf", false)]
    #[case("/metadata-x.rdf", false)]
    #[case("/sub/metadata.rdf", false)]
    #[case("/model.xml", false)]
    fn test_reserved(#[case] input: &str, #[case] reserved: bool) {
        assert_eq!(EntryPath::new(input).is_reserved(), reserved);
    }

    #[test]
    fn test_metadata_index() {
        assert_eq!(EntryPath::new("/metadata.rdf").metadata_index(), Some(0));
        assert_eq!(EntryPath::new("/metadata-7.rdf").metadata_index(), Some(7));
        assert_eq!(EntryPath::new("/meta.rdf").metadata_index(), None);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(input in "[a-z./\\\\]{0,24}") {
            let once = EntryPath::normalize(&input);
            prop_assert_eq!(EntryPath::normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
        }

        #[test]
        fn prop_relative_and_absolute_agree(segments in proptest::collection::vec("[a-z0-9_]{1,6}", 1..5)) {
            let relative = segments.join("/");
            let absolute = format!("/{}", relative);
            let dotted = format!("./{}", relative);
            prop_assert_eq!(EntryPath::normalize(&relative), absolute.clone());
            prop_assert_eq!(EntryPath::normalize(&dotted), absolute.clone());
            prop_assert_eq!(EntryPath::normalize(&absolute), absolute);
        }
    }
}
