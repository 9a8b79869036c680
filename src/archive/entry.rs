//! Archive entries.

use super::path::EntryPath;
use crate::meta::{Describable, EntityId, MetaDataObject};
use std::fmt;
use url::Url;

/// Identity of an entry, unique within one archive instance.
///
/// Ids are handed out by the entry store and never reused, so a description
/// pointing at a removed entry can never be mistaken for one pointing at a
/// later entry at the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A content file registered in an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    id: EntryId,
    path: EntryPath,
    format: Url,
    descriptions: Vec<MetaDataObject>,
}

impl ArchiveEntry {
    pub(crate) fn new(id: EntryId, path: EntryPath, format: Url) -> Self {
        Self {
            id,
            path,
            format,
            descriptions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Normalized location inside the archive, e.g. `/sub/model.xml`.
    #[inline]
    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        self.path.file_name()
    }

    #[inline]
    pub fn format(&self) -> &Url {
        &self.format
    }

    pub(crate) fn set_format(&mut self, format: Url) {
        self.format = format;
    }

    /// Move the entry to a new identity, re-pointing every description.
    pub(crate) fn relocate(&mut self, id: EntryId, path: EntryPath) {
        self.id = id;
        self.path = path;
        let entity = EntityId::Entry(id);
        for description in &mut self.descriptions {
            let fragment = description.fragment().map(str::to_string);
            description.set_about(entity, self.path.as_str(), fragment.as_deref());
        }
    }
}

impl Describable for ArchiveEntry {
    fn entity_id(&self) -> EntityId {
        EntityId::Entry(self.id)
    }

    fn entity_path(&self) -> &str {
        self.path.as_str()
    }

    fn descriptions(&self) -> &[MetaDataObject] {
        &self.descriptions
    }

    fn descriptions_mut(&mut self) -> &mut Vec<MetaDataObject> {
        &mut self.descriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::OmexDescription;

    #[test]
    fn test_relocate_repoints_descriptions() {
        let format = Url::parse("urn:test").unwrap();
        let mut entry = ArchiveEntry::new(EntryId(1), EntryPath::new("a.txt"), format);
        let description = MetaDataObject::omex(OmexDescription::default().with_description("d"));
        assert!(entry.add_description(Some("f"), description));
        assert_eq!(entry.descriptions()[0].about_string(), "/a.txt#f");

        entry.relocate(EntryId(2), EntryPath::new("b/c.txt"));
        assert_eq!(entry.id(), EntryId(2));
        assert_eq!(entry.file_name(), "c.txt");
        let moved = &entry.descriptions()[0];
        assert_eq!(moved.entity(), Some(EntityId::Entry(EntryId(2))));
        assert_eq!(moved.about_string(), "/b/c.txt#f");
    }
}
