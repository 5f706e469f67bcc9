//! Checksum index of a directory tree
//!
//! An index maps every file and directory beneath a root to a checksum.
//! Directory keys end in `/` and always carry [`DIRECTORY_CHECKSUM`].

use crate::hash::{checksum_file, DIRECTORY_CHECKSUM};
use crate::path::{normalize_path, PathError};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Errors that abort an index computation
#[derive(Debug, Error)]
pub enum IndexError {
    /// Reading a file or its metadata failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed (permissions, vanished entry, symlink loop)
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// An entry name cannot be expressed as an index key
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Path -> checksum mapping describing a tree at one instant
///
/// Ordered so that parents always precede their children and the JSON form
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumIndex {
    entries: BTreeMap<String, u64>,
}

impl ChecksumIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the index of everything beneath `root` (root excluded)
    ///
    /// Any I/O error aborts the walk: a partial index would turn unreadable
    /// entries into remote deletions.
    pub fn compute(root: &Path) -> Result<Self, IndexError> {
        let metadata = std::fs::metadata(root).map_err(|source| IndexError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut index = Self::new();

        // A single file is indexed under its own name
        if !metadata.is_dir() {
            let name = root
                .file_name()
                .map(Path::new)
                .map(normalize_path)
                .transpose()?
                .unwrap_or_default();
            let checksum = checksum_file(root).map_err(|source| IndexError::Io {
                path: root.to_path_buf(),
                source,
            })?;
            index.insert(name, checksum);
            return Ok(index);
        }

        for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
            let entry = entry.map_err(|source| IndexError::Walk {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;

            // Entries yielded by WalkDir always live under the walk root
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let key = normalize_path(rel)?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                index.insert_directory(&key);
            } else if file_type.is_file() {
                let checksum = checksum_file(entry.path()).map_err(|source| IndexError::Io {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
                index.insert(key, checksum);
            } else {
                debug!("Skipping special file {}", entry.path().display());
            }
        }

        Ok(index)
    }

    /// Insert a file entry (or a raw entry when deserializing by hand)
    pub fn insert(&mut self, key: impl Into<String>, checksum: u64) -> Option<u64> {
        self.entries.insert(key.into(), checksum)
    }

    /// Insert a directory entry, adding the trailing separator
    pub fn insert_directory(&mut self, key: &str) {
        let key = format!("{}/", key.trim_end_matches('/'));
        self.entries.insert(key, DIRECTORY_CHECKSUM);
    }

    /// Look up the checksum of a key
    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Remove a key, returning its checksum
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.entries.remove(key)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, u64> {
        self.entries.iter()
    }

    /// Iterate keys in order
    pub fn keys(&self) -> btree_map::Keys<'_, String, u64> {
        self.entries.keys()
    }

    /// Parse the JSON form returned by a remote `GET`
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Render the JSON form served for `GET`
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whether an index key names a directory
pub fn is_directory_key(key: &str) -> bool {
    key.ends_with('/')
}

impl IntoIterator for ChecksumIndex {
    type Item = (String, u64);
    type IntoIter = btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChecksumIndex {
    type Item = (&'a String, &'a u64);
    type IntoIter = btree_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, u64)> for ChecksumIndex {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
