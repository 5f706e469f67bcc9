//! Recursive watch registration
//!
//! Per-directory watch APIs (inotify, kqueue) only report events for direct
//! children, so every directory under the root needs its own watch. The
//! registry records which directories are covered and extends coverage when
//! new subtrees appear.

use crate::WatchError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Something that can place a watch on a single directory
pub trait WatchBackend {
    /// Start observing direct children of `dir`; must tolerate repeat calls
    fn watch(&mut self, dir: &Path) -> Result<(), WatchError>;

    /// Stop observing `dir`
    fn unwatch(&mut self, dir: &Path) -> Result<(), WatchError>;
}

/// Set of directories currently under observation
///
/// Owned by the event loop; it is never shared across threads.
pub struct WatchRegistry<B: WatchBackend> {
    backend: B,
    watched: BTreeSet<PathBuf>,
}

impl<B: WatchBackend> WatchRegistry<B> {
    /// Create an empty registry on top of a backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            watched: BTreeSet::new(),
        }
    }

    /// Watch `dir` and every directory beneath it
    ///
    /// Safe to call again on a covered path: the backend call is repeated and
    /// the walk still descends, picking up subdirectories that appeared since.
    /// The first failure aborts the call.
    ///
    /// Returns the number of directories that were not registered before.
    pub fn register_recursive(&mut self, dir: &Path) -> Result<usize, WatchError> {
        let mut added = 0;

        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|source| WatchError::Scan {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf()),
                source,
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            self.backend.watch(entry.path())?;
            if self.watched.insert(entry.path().to_path_buf()) {
                debug!("Watching {}", entry.path().display());
                added += 1;
            }
        }

        Ok(added)
    }

    /// Drop `path` and every registered directory beneath it
    ///
    /// Used when a directory is deleted or renamed away so that a later
    /// directory with the same name gets a fresh watch. Returns how many
    /// entries were removed.
    pub fn forget(&mut self, path: &Path) -> usize {
        let stale: Vec<PathBuf> = self
            .watched
            .range(path.to_path_buf()..)
            .take_while(|p| p.starts_with(path))
            .cloned()
            .collect();

        for dir in &stale {
            // The OS usually drops watches on deleted directories by itself
            if let Err(e) = self.backend.unwatch(dir) {
                debug!("Unwatch {} skipped: {}", dir.display(), e);
            }
            self.watched.remove(dir);
        }

        stale.len()
    }

    /// Check whether a directory is registered
    pub fn contains(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    /// Number of registered directories
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Registered directories in path order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// Access the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
