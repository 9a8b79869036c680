//! Provides the physical container of an archive (a ZIP file).
//!
//! All members are held in memory. Opening reads the whole ZIP file once;
//! changes only touch the in-memory members until the package is rendered
//! with [`PhysPackage::to_bytes`] or written back with [`PhysPackage::flush`].

use super::path::EntryPath;
use crate::common::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound for trusting the uncompressed size a ZIP header declares.
const PREALLOC_LIMIT: u64 = 1 << 20;

/// In-memory ZIP container.
#[derive(Debug, Clone, Default)]
pub struct PhysPackage {
    /// Member contents by member name (no leading slash)
    members: BTreeMap<String, Vec<u8>>,
    /// File the package was opened from or will be written to
    location: Option<PathBuf>,
}

impl PhysPackage {
    /// Create an empty package, optionally bound to a file.
    pub fn new(location: Option<PathBuf>) -> Self {
        Self {
            members: BTreeMap::new(),
            location,
        }
    }

    /// Open a package from a ZIP file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a ZIP archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let data = std::fs::read(path)?;
        let mut package = Self::from_bytes(&data)?;
        package.location = Some(path.to_path_buf());
        Ok(package)
    }

    /// Load a package from ZIP data.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::InvalidFormat(format!("not a ZIP archive: {}", e)))?;

        let mut members = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = EntryPath::new(file.name()).member_name().to_string();
            let mut content = Vec::with_capacity(file.size().min(PREALLOC_LIMIT) as usize);
            file.read_to_end(&mut content)?;
            members.insert(name, content);
        }

        Ok(Self {
            members,
            location: None,
        })
    }

    /// File backing this package, if any.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Get the content of a member.
    #[inline]
    pub fn read(&self, path: &EntryPath) -> Option<&[u8]> {
        self.members.get(path.member_name()).map(Vec::as_slice)
    }

    /// Get a member as UTF-8 text.
    pub fn read_string(&self, path: &EntryPath) -> Result<Option<String>> {
        match self.read(path) {
            Some(bytes) => Ok(Some(std::str::from_utf8(bytes)?.to_string())),
            None => Ok(None),
        }
    }

    /// Create or overwrite a member.
    pub fn write(&mut self, path: &EntryPath, content: Vec<u8>) {
        self.members.insert(path.member_name().to_string(), content);
    }

    /// Delete a member. Returns whether it existed.
    pub fn remove(&mut self, path: &EntryPath) -> bool {
        self.members.remove(path.member_name()).is_some()
    }

    /// Move a member. Returns whether `from` existed.
    pub fn rename(&mut self, from: &EntryPath, to: &EntryPath) -> bool {
        match self.members.remove(from.member_name()) {
            Some(content) => {
                self.members.insert(to.member_name().to_string(), content);
                true
            },
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, path: &EntryPath) -> bool {
        self.members.contains_key(path.member_name())
    }

    /// List all member names.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Render the package as ZIP data.
    pub fn to_bytes(&self, compression: CompressionMethod) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(compression);

        for (name, content) in &self.members {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(content)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to its backing file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] for packages without a backing file.
    pub fn flush(&self, compression: CompressionMethod) -> Result<()> {
        let location = self
            .location
            .as_deref()
            .ok_or_else(|| Error::InvalidPath("archive has no backing file".to_string()))?;
        let data = self.to_bytes(compression)?;
        std::fs::write(location, data)?;
        Ok(())
    }
}
