//! The entry index of an archive.

use super::entry::{ArchiveEntry, EntryId};
use super::path::EntryPath;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Entries by normalized path, plus the ordered list of main entries.
///
/// Paths are unique keys. Ids are allocated here and never reused.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: BTreeMap<EntryPath, ArchiveEntry>,
    paths: HashMap<EntryId, EntryPath>,
    main_entries: Vec<EntryId>,
    next_id: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    /// Register an entry at `path`.
    ///
    /// An entry already at `path` keeps its id and descriptions and takes the
    /// new format.
    pub fn put(&mut self, path: EntryPath, format: Url) -> EntryId {
        if let Some(existing) = self.entries.get_mut(&path) {
            existing.set_format(format);
            return existing.id();
        }
        let id = self.allocate();
        self.paths.insert(id, path.clone());
        self.entries.insert(path.clone(), ArchiveEntry::new(id, path, format));
        id
    }

    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.get(EntryPath::normalize(path).as_str())
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ArchiveEntry> {
        self.entries.get_mut(EntryPath::normalize(path).as_str())
    }

    pub fn get_by_id(&self, id: EntryId) -> Option<&ArchiveEntry> {
        self.paths.get(&id).and_then(|path| self.entries.get(path))
    }

    pub fn get_by_id_mut(&mut self, id: EntryId) -> Option<&mut ArchiveEntry> {
        let path = self.paths.get(&id)?;
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Remove the entry at `path` and drop it from the main entries.
    pub fn remove(&mut self, path: &str) -> Option<ArchiveEntry> {
        let entry = self.entries.remove(EntryPath::normalize(path).as_str())?;
        self.paths.remove(&entry.id());
        self.main_entries.retain(|id| *id != entry.id());
        Some(entry)
    }

    /// Move the entry at `from` to `to` under a fresh id.
    ///
    /// Descriptions travel with the entry and are re-pointed. A main entry
    /// keeps its position in the main list. Returns `None` when `from` is
    /// unknown or `to` is taken.
    pub fn relocate(&mut self, from: &str, to: EntryPath) -> Option<EntryId> {
        if self.entries.contains_key(&to) {
            return None;
        }
        let mut entry = self.entries.remove(EntryPath::normalize(from).as_str())?;
        let old_id = entry.id();
        let new_id = self.allocate();

        entry.relocate(new_id, to.clone());
        self.paths.remove(&old_id);
        self.paths.insert(new_id, to.clone());
        self.entries.insert(to, entry);
        for id in &mut self.main_entries {
            if *id == old_id {
                *id = new_id;
            }
        }
        Some(new_id)
    }

    /// Entries ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Main entries in the order they were flagged.
    pub fn main_entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.main_entries.iter().filter_map(|id| self.get_by_id(*id))
    }

    pub fn is_main(&self, id: EntryId) -> bool {
        self.main_entries.contains(&id)
    }

    /// Make `id` the only main entry.
    pub fn set_main(&mut self, id: EntryId) -> bool {
        if !self.paths.contains_key(&id) {
            return false;
        }
        self.main_entries.clear();
        self.main_entries.push(id);
        true
    }

    /// Flag `id` as main entry. Returns `false` if unknown.
    pub fn add_main(&mut self, id: EntryId) -> bool {
        if !self.paths.contains_key(&id) {
            return false;
        }
        if !self.main_entries.contains(&id) {
            self.main_entries.push(id);
        }
        true
    }

    /// Unflag `id`. Returns whether it was a main entry.
    pub fn remove_main(&mut self, id: EntryId) -> bool {
        let before = self.main_entries.len();
        self.main_entries.retain(|m| *m != id);
        before != self.main_entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{Describable, MetaDataObject, OmexDescription};

    fn format(name: &str) -> Url {
        Url::parse(&format!("urn:format:{}", name)).unwrap()
    }

    #[test]
    fn test_put_normalizes_and_replaces() {
        let mut store = EntryStore::new();
        let id = store.put(EntryPath::new("./sub/file.ext"), format("a"));
        assert_eq!(store.get("sub/file.ext").unwrap().id(), id);
        assert_eq!(store.get("/sub/file.ext").unwrap().format(), &format("a"));

        let description = MetaDataObject::omex(OmexDescription::default().with_description("x"));
        store.get_mut("/sub/file.ext").unwrap().add_description(None, description);

        let again = store.put(EntryPath::new("/sub/file.ext"), format("b"));
        assert_eq!(again, id);
        let entry = store.get("/sub/file.ext").unwrap();
        assert_eq!(entry.format(), &format("b"));
        assert_eq!(entry.descriptions().len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_prunes_main_entries() {
        let mut store = EntryStore::new();
        let a = store.put(EntryPath::new("a"), format("a"));
        let b = store.put(EntryPath::new("b"), format("b"));
        store.add_main(a);

        assert!(store.remove("/b").is_some());
        assert_eq!(store.main_entries().count(), 1);
        assert!(store.remove("b").is_none());

        assert!(store.remove("a").is_some());
        assert_eq!(store.main_entries().count(), 0);
        assert!(store.get_by_id(b).is_none());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut store = EntryStore::new();
        let first = store.put(EntryPath::new("a"), format("a"));
        store.remove("a");
        let second = store.put(EntryPath::new("a"), format("a"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_main_entry_operations() {
        let mut store = EntryStore::new();
        let a = store.put(EntryPath::new("a"), format("a"));
        let b = store.put(EntryPath::new("b"), format("b"));

        assert!(store.add_main(a));
        assert!(store.add_main(b));
        assert!(store.add_main(a));
        let main: Vec<_> = store.main_entries().map(|e| e.id()).collect();
        assert_eq!(main, vec![a, b]);

        assert!(store.set_main(b));
        assert!(!store.is_main(a));
        assert!(store.remove_main(b));
        assert!(!store.remove_main(b));
        assert!(!store.add_main(EntryId(99)));
    }

    #[test]
    fn test_relocate_keeps_main_position() {
        let mut store = EntryStore::new();
        let a = store.put(EntryPath::new("a"), format("a"));
        let b = store.put(EntryPath::new("b"), format("b"));
        store.add_main(a);
        store.add_main(b);

        let moved = store.relocate("/a", EntryPath::new("/c")).unwrap();
        assert_ne!(moved, a);
        assert!(store.get("a").is_none());
        let main: Vec<_> = store.main_entries().map(|e| e.path().to_string()).collect();
        assert_eq!(main, vec!["/c", "/b"]);

        assert!(store.relocate("/c", EntryPath::new("/b")).is_none());
        assert!(store.relocate("/missing", EntryPath::new("/d")).is_none());
    }
}
