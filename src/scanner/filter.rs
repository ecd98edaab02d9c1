//! File eligibility rules shared by the walker and the inventory reader.
//!
//! A file is eligible when its extension is in a case-insensitive
//! allow-list and its name is not operating-system metadata junk
//! (`.DS_Store`, AppleDouble `._*` companions).

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

/// Audio extensions scanned when no list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "aac", "aif", "aiff", "alac", "ape", "flac", "m4a", "mp3", "ogg", "opus", "wav", "wma",
];

/// Returns true for metadata files that must never be hashed or moved.
#[must_use]
pub fn is_junk_name(name: impl AsRef<OsStr>) -> bool {
    let name = name.as_ref();
    name.eq_ignore_ascii_case(".DS_Store") || name.as_encoded_bytes().starts_with(b"._")
}

/// Case-insensitive extension allow-list plus the junk-name rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    extensions: BTreeSet<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl FileFilter {
    /// Build a filter from extensions. Leading dots and case are ignored,
    /// blank entries are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { extensions }
    }

    /// Normalized extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// True when no extension is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Check a bare file name. Names need not be valid UTF-8; only the
    /// extension is compared, lossily and lowercased.
    #[must_use]
    pub fn allows_name(&self, name: impl AsRef<OsStr>) -> bool {
        let name = name.as_ref();
        if is_junk_name(name) {
            return false;
        }
        Path::new(name)
            .extension()
            .is_some_and(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
    }

    /// Check the final component of a path.
    #[must_use]
    pub fn allows(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.allows_name(name))
    }
}
