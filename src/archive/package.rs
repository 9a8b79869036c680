//! The COMBINE archive.

use super::constants::location;
use super::entry::{ArchiveEntry, EntryId};
use super::manifest::{self, ManifestEntry};
use super::options::ArchiveOptions;
use super::path::EntryPath;
use super::phys_pkg::PhysPackage;
use super::store::EntryStore;
use crate::common::{Error, ErrorLog, Result};
use crate::meta::reader::{self, EntityTargets};
use crate::meta::{Describable, EntityId, MetaDataObject, PseudoEntity, writer};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Borrowed view of everything a metadata document can describe.
struct Targets<'a> {
    entries: &'a mut EntryStore,
    metadata_files: &'a [EntryPath],
    archive: &'a mut PseudoEntity,
    meta: &'a mut PseudoEntity,
}

impl EntityTargets for Targets<'_> {
    fn entry_at(&self, path: &str) -> Option<EntityId> {
        self.entries.get(path).map(|e| EntityId::Entry(e.id()))
    }

    fn is_metadata_file(&self, path: &str) -> bool {
        self.metadata_files.iter().any(|p| p.as_str() == path)
    }

    fn describable_mut(&mut self, id: EntityId) -> Option<&mut dyn Describable> {
        match id {
            EntityId::Archive => Some(&mut *self.archive),
            EntityId::MetaDataFile => Some(&mut *self.meta),
            EntityId::Entry(id) => self
                .entries
                .get_by_id_mut(id)
                .map(|e| e as &mut dyn Describable),
        }
    }
}

/// A COMBINE/OMEX archive.
///
/// The archive keeps its container in memory. Mutations change the entry
/// index, the descriptions and the in-memory members; [`pack`](Self::pack)
/// regenerates the manifest and metadata documents, and
/// [`close`](Self::close) writes the ZIP file.
///
/// # Examples
///
/// ```no_run
/// use omex_archive::archive::CombineArchive;
/// use omex_archive::meta::{MetaDataObject, OmexDescription, VCard};
/// use url::Url;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut archive = CombineArchive::create("model.omex")?;
/// let sbml = Url::parse("http://identifiers.org/combine.specifications/sbml")?;
/// archive.add_entry("model.xml", "model.xml", &sbml, true)?;
///
/// let creator = VCard::new("Doe", "Jane", "jane@example.org", "Example Lab");
/// let description = OmexDescription::new(creator, chrono::Utc::now());
/// if let Some(entry) = archive.entry_mut("/model.xml") {
///     use omex_archive::meta::Describable;
///     entry.add_description(None, MetaDataObject::omex(description));
/// }
///
/// archive.pack()?;
/// archive.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CombineArchive {
    package: PhysPackage,
    options: ArchiveOptions,
    entries: EntryStore,
    metadata_files: Vec<EntryPath>,
    archive: PseudoEntity,
    meta: PseudoEntity,
    errors: ErrorLog,
    /// Model changed since the last pack
    unpacked: bool,
    /// Container changed since the last flush
    unflushed: bool,
}

impl CombineArchive {
    fn with_package(package: PhysPackage, options: ArchiveOptions) -> Self {
        let errors = ErrorLog::new(options.continue_on_error);
        Self {
            package,
            options,
            entries: EntryStore::new(),
            metadata_files: Vec::new(),
            archive: PseudoEntity::archive(),
            meta: PseudoEntity::metadata_files(),
            errors,
            unpacked: false,
            unflushed: false,
        }
    }

    /// Create an empty in-memory archive.
    pub fn new(options: ArchiveOptions) -> Self {
        Self::with_package(PhysPackage::new(None), options)
    }

    /// Create an empty archive that [`close`](Self::close) writes to `path`.
    ///
    /// An existing file at `path` is replaced on close.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(Error::InvalidPath(path.display().to_string()));
        }
        let mut archive = Self::with_package(
            PhysPackage::new(Some(path.to_path_buf())),
            ArchiveOptions::default(),
        );
        archive.unpacked = true;
        archive.unflushed = true;
        Ok(archive)
    }

    /// Open an existing archive in strict mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ArchiveOptions::default())
    }

    /// Open an existing archive.
    ///
    /// # Errors
    /// Fails if the file cannot be read as a ZIP archive. Problems with the
    /// manifest or metadata fail in strict mode and are collected in
    /// [`errors`](Self::errors) in lenient mode.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let package = PhysPackage::open(path)?;
        Self::load(package, options)
    }

    /// Read an archive from ZIP data.
    pub fn from_bytes(data: &[u8], options: ArchiveOptions) -> Result<Self> {
        let package = PhysPackage::from_bytes(data)?;
        Self::load(package, options)
    }

    fn load(package: PhysPackage, options: ArchiveOptions) -> Result<Self> {
        let mut archive = Self::with_package(package, options);
        archive.read_manifest()?;
        archive.read_metadata_files()?;
        log::debug!(
            "opened archive with {} entries and {} metadata files",
            archive.entries.len(),
            archive.metadata_files.len()
        );
        Ok(archive)
    }

    fn read_manifest(&mut self) -> Result<()> {
        let manifest_path = EntryPath::new(location::MANIFEST);
        let document = match self.package.read_string(&manifest_path) {
            Ok(Some(document)) => document,
            Ok(None) => {
                return self.errors.record(Error::InvalidFormat(
                    "archive contains no manifest".to_string(),
                ));
            },
            Err(e) => return self.errors.record(e),
        };

        let package = &self.package;
        let decoded = manifest::decode(&document, |p| package.contains(p), &mut self.errors)?;

        for ManifestEntry { path, format, main } in decoded.entries {
            let id = self.entries.put(path, format);
            if main {
                self.entries.add_main(id);
            }
        }
        self.metadata_files = decoded.metadata_files;
        Ok(())
    }

    fn read_metadata_files(&mut self) -> Result<()> {
        let mut targets = Targets {
            entries: &mut self.entries,
            metadata_files: &self.metadata_files,
            archive: &mut self.archive,
            meta: &mut self.meta,
        };

        for file in &self.metadata_files {
            let document = match self.package.read_string(file) {
                Ok(Some(document)) => document,
                Ok(None) => {
                    self.errors.record(Error::FileNotFound(file.to_string()))?;
                    continue;
                },
                Err(e) => {
                    self.errors.record(e)?;
                    continue;
                },
            };
            reader::read_metadata(file.as_str(), &document, &mut targets, &mut self.errors)?;
        }
        Ok(())
    }

    /// Reject paths that cannot hold an entry.
    fn check_target(&self, path: &EntryPath) -> Result<()> {
        if path.is_root() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        if path.is_reserved() || self.metadata_files.contains(path) {
            return Err(Error::ReservedPath(path.to_string()));
        }
        Ok(())
    }

    fn stored(&self, id: EntryId) -> Result<&ArchiveEntry> {
        self.entries
            .get_by_id(id)
            .ok_or_else(|| Error::EntryNotFound(id.to_string()))
    }

    /// Add the file `source` as entry `target`.
    ///
    /// An entry already at `target` is overwritten: its content and format
    /// are replaced, its descriptions are kept.
    pub fn add_entry<P: AsRef<Path>>(
        &mut self,
        source: P,
        target: &str,
        format: &Url,
        main: bool,
    ) -> Result<&ArchiveEntry> {
        let content = std::fs::read(source)?;
        self.add_entry_bytes(content, target, format, main)
    }

    /// Add in-memory content as entry `target`.
    pub fn add_entry_bytes<C: Into<Vec<u8>>>(
        &mut self,
        content: C,
        target: &str,
        format: &Url,
        main: bool,
    ) -> Result<&ArchiveEntry> {
        let path = EntryPath::new(target);
        self.check_target(&path)?;

        self.package.write(&path, content.into());
        let id = self.entries.put(path, format.clone());
        if main {
            self.entries.add_main(id);
        }
        self.unpacked = true;
        self.unflushed = true;
        self.stored(id)
    }

    /// Add `file` with its location relative to `base_dir` as target.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] if `file` is not inside `base_dir`.
    pub fn add_entry_from_dir<B: AsRef<Path>, P: AsRef<Path>>(
        &mut self,
        base_dir: B,
        file: P,
        format: &Url,
        main: bool,
    ) -> Result<&ArchiveEntry> {
        let file = file.as_ref();
        let relative = file
            .strip_prefix(base_dir.as_ref())
            .map_err(|_| Error::InvalidPath(file.display().to_string()))?;

        let mut target = String::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    target.push('/');
                    target.push_str(&part.to_string_lossy());
                },
                Component::CurDir => {},
                _ => return Err(Error::InvalidPath(file.display().to_string())),
            }
        }
        self.add_entry(file, &target, format, main)
    }

    /// Add an entry whose format is given as short name, URI or MIME type.
    pub fn add_entry_with_format_name<P: AsRef<Path>>(
        &mut self,
        source: P,
        target: &str,
        format: &str,
        main: bool,
    ) -> Result<&ArchiveEntry> {
        let format = self.options.formats.resolve(format)?;
        self.add_entry(source, target, &format, main)
    }

    /// Remove the entry at `path` together with its content and descriptions.
    ///
    /// Returns `false` if there is no such entry.
    pub fn remove_entry(&mut self, path: &str) -> bool {
        match self.entries.remove(path) {
            Some(entry) => {
                self.package.remove(entry.path());
                self.unpacked = true;
                self.unflushed = true;
                true
            },
            None => false,
        }
    }

    /// Move the entry at `old` to `new`.
    ///
    /// The moved entry gets a new id. Its descriptions move along and are
    /// re-pointed to the new path; main-entry membership is kept.
    pub fn move_entry(&mut self, old: &str, new: &str) -> Result<&ArchiveEntry> {
        let old_path = EntryPath::new(old);
        let new_path = EntryPath::new(new);
        if !self.entries.contains(old_path.as_str()) {
            return Err(Error::EntryNotFound(old_path.to_string()));
        }
        self.check_target(&new_path)?;
        if self.entries.contains(new_path.as_str()) {
            return Err(Error::EntryExists(new_path.to_string()));
        }

        self.package.rename(&old_path, &new_path);
        let id = self
            .entries
            .relocate(old_path.as_str(), new_path.clone())
            .ok_or_else(|| Error::EntryExists(new_path.to_string()))?;
        self.unpacked = true;
        self.unflushed = true;
        self.stored(id)
    }

    /// Replace the content of the entry at `path` with the file `source`.
    ///
    /// The entry, its format and its descriptions are kept.
    pub fn replace_file<P: AsRef<Path>>(&mut self, source: P, path: &str) -> Result<&ArchiveEntry> {
        let content = std::fs::read(source)?;
        self.replace_bytes(content, path)
    }

    /// Replace the content of the entry at `path`.
    pub fn replace_bytes<C: Into<Vec<u8>>>(&mut self, content: C, path: &str) -> Result<&ArchiveEntry> {
        let id = self
            .entries
            .get(path)
            .map(|e| e.id())
            .ok_or_else(|| Error::EntryNotFound(EntryPath::normalize(path)))?;
        let entry_path = EntryPath::new(path);
        self.package.write(&entry_path, content.into());
        self.unflushed = true;
        self.stored(id)
    }

    /// Get the entry at `path` (any form: `./a`, `a`, `/a`).
    pub fn entry(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.get(path)
    }

    /// Mutable access to an entry, e.g. to attach descriptions.
    pub fn entry_mut(&mut self, path: &str) -> Option<&mut ArchiveEntry> {
        let entry = self.entries.get_mut(path)?;
        self.unpacked = true;
        Some(entry)
    }

    pub fn entry_by_id(&self, id: EntryId) -> Option<&ArchiveEntry> {
        self.entries.get_by_id(id)
    }

    pub fn has_entry(&self, path: &str) -> bool {
        self.entries.contains(path)
    }

    /// All entries, ordered by path.
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Entries with the given format.
    pub fn entries_with_format(&self, format: &Url) -> Vec<&ArchiveEntry> {
        self.entries.iter().filter(|e| e.format() == format).collect()
    }

    pub fn has_entries_with_format(&self, format: &Url) -> bool {
        self.entries.iter().any(|e| e.format() == format)
    }

    pub fn num_entries_with_format(&self, format: &Url) -> usize {
        self.entries.iter().filter(|e| e.format() == format).count()
    }

    /// Locations of the metadata documents read or written last.
    pub fn metadata_files(&self) -> &[EntryPath] {
        &self.metadata_files
    }

    /// Main entries in the order they were flagged.
    pub fn main_entries(&self) -> Vec<&ArchiveEntry> {
        self.entries.main_entries().collect()
    }

    /// The first main entry.
    #[deprecated(note = "archives may have several main entries; use `main_entries`")]
    pub fn main_entry(&self) -> Option<&ArchiveEntry> {
        self.entries.main_entries().next()
    }

    fn id_of(&self, path: &str) -> Result<EntryId> {
        self.entries
            .get(path)
            .map(|e| e.id())
            .ok_or_else(|| Error::EntryNotFound(EntryPath::normalize(path)))
    }

    /// Make the entry at `path` the only main entry.
    pub fn set_main_entry(&mut self, path: &str) -> Result<()> {
        let id = self.id_of(path)?;
        self.entries.set_main(id);
        self.unpacked = true;
        Ok(())
    }

    /// Flag the entry at `path` as main entry.
    pub fn add_main_entry(&mut self, path: &str) -> Result<()> {
        let id = self.id_of(path)?;
        self.entries.add_main(id);
        self.unpacked = true;
        Ok(())
    }

    /// Unflag the entry at `path`. Returns whether it was a main entry.
    pub fn remove_main_entry(&mut self, path: &str) -> bool {
        let Ok(id) = self.id_of(path) else {
            return false;
        };
        let removed = self.entries.remove_main(id);
        self.unpacked |= removed;
        removed
    }

    /// Descriptions of the metadata documents themselves.
    pub fn metadata_entity(&self) -> &PseudoEntity {
        &self.meta
    }

    pub fn metadata_entity_mut(&mut self) -> &mut PseudoEntity {
        self.unpacked = true;
        &mut self.meta
    }

    /// Mutable access to any described entity.
    pub fn describable_mut(&mut self, id: EntityId) -> Option<&mut dyn Describable> {
        self.unpacked = true;
        match id {
            EntityId::Archive => Some(&mut self.archive),
            EntityId::MetaDataFile => Some(&mut self.meta),
            EntityId::Entry(id) => self
                .entries
                .get_by_id_mut(id)
                .map(|e| e as &mut dyn Describable),
        }
    }

    /// Attach every description of a metadata document to the entry at
    /// `path`, ignoring what the descriptions say they are about.
    ///
    /// Returns the number of descriptions added.
    pub fn add_all_descriptions(&mut self, path: &str, document: &str) -> Result<usize> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| Error::EntryNotFound(EntryPath::normalize(path)))?;
        let added = reader::add_all_to_entity(document, entry)?;
        self.unpacked |= added > 0;
        Ok(added)
    }

    /// Get the content of the entry at `path`.
    pub fn read_entry(&self, path: &str) -> Result<&[u8]> {
        let entry = self
            .entries
            .get(path)
            .ok_or_else(|| Error::EntryNotFound(EntryPath::normalize(path)))?;
        self.package
            .read(entry.path())
            .ok_or_else(|| Error::FileNotFound(entry.path().to_string()))
    }

    /// Write the content of the entry at `path` to `destination`.
    pub fn extract<P: AsRef<Path>>(&self, path: &str, destination: P) -> Result<PathBuf> {
        let content = self.read_entry(path)?;
        let destination = destination.as_ref();
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, content)?;
        Ok(destination.to_path_buf())
    }

    /// Write every entry below `directory`, mirroring the archive layout.
    pub fn extract_to<P: AsRef<Path>>(&self, directory: P) -> Result<Vec<PathBuf>> {
        let directory = directory.as_ref();
        self.entries
            .iter()
            .map(|entry| {
                self.extract(entry.path().as_str(), directory.join(entry.path().member_name()))
            })
            .collect()
    }

    /// Regenerate the manifest and one combined metadata document.
    pub fn pack(&mut self) -> Result<()> {
        self.pack_with(false)
    }

    /// Regenerate the manifest and the metadata documents.
    ///
    /// Previously known metadata documents are deleted. With
    /// `multiple_meta_files` the archive and metadata descriptions go to
    /// `/metadata.rdf` and every described entry gets a document of its own;
    /// otherwise all descriptions go to `/metadata.rdf`.
    pub fn pack_with(&mut self, multiple_meta_files: bool) -> Result<()> {
        for file in self.metadata_files.drain(..) {
            self.package.remove(&file);
        }

        let roots: [&dyn Describable; 2] = [&self.archive, &self.meta];
        let mut documents: Vec<String> = Vec::new();
        if multiple_meta_files {
            documents.push(writer::write_metadata(roots));
            for entry in self.entries.iter() {
                let entity: [&dyn Describable; 1] = [entry];
                if writer::has_descriptions(entity) {
                    documents.push(writer::write_metadata(entity));
                }
            }
        } else {
            let all = roots
                .into_iter()
                .chain(self.entries.iter().map(|e| e as &dyn Describable));
            documents.push(writer::write_metadata(all));
        }

        let mut next_index = 0u64;
        for document in documents {
            let path = loop {
                let candidate = if next_index == 0 {
                    EntryPath::new(location::METADATA)
                } else {
                    EntryPath::new(&format!(
                        "/{}{}{}",
                        location::METADATA_PREFIX,
                        next_index,
                        location::METADATA_SUFFIX
                    ))
                };
                next_index += 1;
                if !self.package.contains(&candidate) {
                    break candidate;
                }
            };
            self.package.write(&path, document.into_bytes());
            self.metadata_files.push(path);
        }

        let manifest = manifest::encode(
            self.entries
                .iter()
                .map(|e| (e.path(), e.format(), self.entries.is_main(e.id()))),
            &self.metadata_files,
        );
        self.package
            .write(&EntryPath::new(location::MANIFEST), manifest.into_bytes());

        log::debug!(
            "packed {} entries and {} metadata files",
            self.entries.len(),
            self.metadata_files.len()
        );
        self.unpacked = false;
        self.unflushed = true;
        Ok(())
    }

    /// Render the container as ZIP data.
    ///
    /// Call [`pack`](Self::pack) first to include pending changes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let data = self.package.to_bytes(self.options.compression)?;
        if self.package.location().is_none() {
            self.unflushed = false;
        }
        Ok(data)
    }

    /// Write the container to its file and release the archive.
    ///
    /// Call [`pack`](Self::pack) first to include pending changes.
    pub fn close(mut self) -> Result<()> {
        self.package.flush(self.options.compression)?;
        self.unflushed = false;
        if self.unpacked {
            log::warn!("archive closed without packing its latest changes");
            self.unpacked = false;
        }
        Ok(())
    }

    /// File backing the archive, if any.
    pub fn location(&self) -> Option<&Path> {
        self.package.location()
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Errors collected in lenient mode.
    pub fn errors(&self) -> &[String] {
        self.errors.errors()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.errors = ErrorLog::new(self.options.continue_on_error);
    }
}

impl Describable for CombineArchive {
    fn entity_id(&self) -> EntityId {
        EntityId::Archive
    }

    fn entity_path(&self) -> &str {
        location::ARCHIVE
    }

    fn descriptions(&self) -> &[MetaDataObject] {
        self.archive.descriptions()
    }

    fn descriptions_mut(&mut self) -> &mut Vec<MetaDataObject> {
        self.unpacked = true;
        self.archive.descriptions_mut()
    }
}

impl Drop for CombineArchive {
    fn drop(&mut self) {
        if self.unpacked || (self.unflushed && self.package.location().is_some()) {
            log::warn!(
                "archive {} dropped with unsaved changes",
                self.package
                    .location()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(in memory)".to_string())
            );
        }
    }
}
