//! Synchronization intents

use crate::index::is_directory_key;
use std::fmt;

/// What to do with a remote path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    /// Transmit file content, or ensure a directory exists
    Push,
    /// Remove whatever exists at the path
    Delete,
}

/// One required remote action
///
/// `path` is normalized and never carries a trailing separator; directories
/// are flagged through `is_directory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncIntent {
    pub kind: IntentKind,
    pub path: String,
    pub is_directory: bool,
}

impl SyncIntent {
    /// Push a file's content
    pub fn push_file(path: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Push,
            path: path.into(),
            is_directory: false,
        }
    }

    /// Ensure a directory exists remotely
    pub fn push_directory(path: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Push,
            path: path.into(),
            is_directory: true,
        }
    }

    /// Remove a path remotely
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Delete,
            path: path.into(),
            is_directory: false,
        }
    }

    /// Build an intent from an index key (`dir/` marks a directory)
    pub fn from_index_key(kind: IntentKind, key: &str) -> Self {
        Self {
            kind,
            path: key.trim_end_matches('/').to_string(),
            is_directory: is_directory_key(key),
        }
    }
}

impl fmt::Display for SyncIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            IntentKind::Push => "push",
            IntentKind::Delete => "delete",
        };
        if self.is_directory {
            write!(f, "{} {}/", verb, self.path)
        } else {
            write!(f, "{} {}", verb, self.path)
        }
    }
}
