//! Entities that carry descriptions.

use super::object::{EntityId, MetaDataObject};
use crate::archive::constants::location;

/// Something that can be described by metadata objects.
///
/// Implemented by the archive root, the metadata-document pseudo-entity and
/// every [`ArchiveEntry`](crate::archive::ArchiveEntry).
pub trait Describable {
    /// Stable identity of the entity.
    fn entity_id(&self) -> EntityId;

    /// Path used in `rdf:about` references.
    fn entity_path(&self) -> &str;

    /// Descriptions attached to the entity.
    fn descriptions(&self) -> &[MetaDataObject];

    fn descriptions_mut(&mut self) -> &mut Vec<MetaDataObject>;

    /// Attach `object`, optionally to a fragment of the entity.
    ///
    /// The object is pointed at this entity first. Returns `false` and drops
    /// the object when an equal description is already attached.
    fn add_description(&mut self, fragment: Option<&str>, mut object: MetaDataObject) -> bool {
        let id = self.entity_id();
        object.set_about(id, self.entity_path(), fragment);
        if self.descriptions().contains(&object) {
            return false;
        }
        self.descriptions_mut().push(object);
        true
    }

    /// Detach the first description equal to `object`.
    fn remove_description(&mut self, object: &MetaDataObject) -> bool {
        let descriptions = self.descriptions_mut();
        match descriptions.iter().position(|d| d == object) {
            Some(index) => {
                descriptions.remove(index);
                true
            },
            None => false,
        }
    }
}

/// An entity without content: the archive itself or its metadata documents.
#[derive(Debug, Clone)]
pub struct PseudoEntity {
    id: EntityId,
    path: &'static str,
    descriptions: Vec<MetaDataObject>,
}

impl PseudoEntity {
    /// The archive itself (`.`).
    pub fn archive() -> Self {
        Self {
            id: EntityId::Archive,
            path: location::ARCHIVE,
            descriptions: Vec::new(),
        }
    }

    /// The metadata documents of the archive (`/metadata.rdf`).
    pub fn metadata_files() -> Self {
        Self {
            id: EntityId::MetaDataFile,
            path: location::METADATA,
            descriptions: Vec::new(),
        }
    }
}

impl Describable for PseudoEntity {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn entity_path(&self) -> &str {
        self.path
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
    use crate::meta::omex::OmexDescription;

    fn object(text: &str) -> MetaDataObject {
        MetaDataObject::omex(OmexDescription::default().with_description(text))
    }

    #[test]
    fn test_add_description_deduplicates() {
        let mut archive = PseudoEntity::archive();
        assert!(archive.add_description(None, object("one")));
        assert!(!archive.add_description(None, object("one")));
        assert!(archive.add_description(Some("part"), object("one")));
        assert!(archive.add_description(None, object("two")));
        assert_eq!(archive.descriptions().len(), 3);

        let first = &archive.descriptions()[0];
        assert_eq!(first.entity(), Some(EntityId::Archive));
        assert_eq!(first.about_string(), ".");
        assert_eq!(archive.descriptions()[1].about_string(), ".#part");
    }

    #[test]
    fn test_remove_description() {
        let mut meta = PseudoEntity::metadata_files();
        meta.add_description(None, object("one"));
        let mut probe = object("one");
        probe.set_about(EntityId::MetaDataFile, "/metadata.rdf", None);
        assert!(meta.remove_description(&probe));
        assert!(!meta.remove_description(&probe));
        assert!(meta.descriptions().is_empty());
    }
}
