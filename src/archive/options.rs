//! Archive configuration.

use super::formats::FormatRegistry;
use zip::CompressionMethod;

/// Configuration for opening and writing archives.
///
/// # Examples
///
/// ```rust
/// use omex_archive::archive::{ArchiveOptions, FormatRegistry};
/// use zip::CompressionMethod;
///
/// // Strict reading, default formats, deflate compression
/// let options = ArchiveOptions::default();
///
/// // Or customize
/// let options = ArchiveOptions::new()
///     .with_continue_on_error(true)
///     .with_formats(FormatRegistry::default())
///     .with_compression(CompressionMethod::Stored);
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Record content errors and keep going instead of failing
    pub continue_on_error: bool,
    /// Short format names accepted by the name-based API
    pub formats: FormatRegistry,
    /// Compression of members written to the ZIP file
    pub compression: CompressionMethod,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            formats: FormatRegistry::default(),
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ArchiveOptions {
    /// Create a new `ArchiveOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for lenient reading: errors are collected, not returned.
    #[inline]
    pub fn lenient() -> Self {
        Self::default().with_continue_on_error(true)
    }

    #[inline]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    #[inline]
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    #[inline]
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let options = ArchiveOptions::new();
        assert!(!options.continue_on_error);
        assert_eq!(options.compression, CompressionMethod::Deflated);

        let options = ArchiveOptions::lenient()
            .with_formats(FormatRegistry::empty())
            .with_compression(CompressionMethod::Stored);
        assert!(options.continue_on_error);
        assert!(options.formats.is_empty());
        assert_eq!(options.compression, CompressionMethod::Stored);
    }
}
