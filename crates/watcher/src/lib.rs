//! File system watching for Treesync
//!
//! This crate turns live filesystem mutations into sync intents:
//! - Per-directory watch registration that follows new subtrees
//! - Translation of raw notifications into push/delete intents
//! - A pluggable event stage (passthrough or time-window coalescing)

pub mod debounce;
pub mod platform;
pub mod registry;
pub mod translate;

use std::path::PathBuf;
use thiserror::Error;

pub use debounce::{stage_for, Coalescing, EventStage, Passthrough};
pub use platform::NotifyBackend;
pub use registry::{WatchBackend, WatchRegistry};
pub use translate::EventTranslator;

/// File system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Path created (or moved in)
    Create,
    /// Content or metadata modified
    Modify,
    /// Path deleted
    Delete,
    /// Path renamed away (source side)
    Rename,
}

/// Everything the watch subsystem delivers, merged into one ordered stream
#[derive(Debug)]
pub enum WatchMessage {
    /// A filesystem change
    Event(WatchEvent),
    /// The watch subsystem reported an error (queue overflow, backend failure)
    Error(notify::Error),
}

/// Watch registration errors
#[derive(Debug, Error)]
pub enum WatchError {
    /// Creating the OS watcher failed
    #[error("failed to initialize file watcher: {0}")]
    Init(#[source] notify::Error),

    /// Registering a directory failed (watch table exhausted, path removed)
    #[error("failed to watch {path}: {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Listing a directory's children failed
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
