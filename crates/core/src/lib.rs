//! Treesync Core - checksum indexes and tree diffing
//!
//! This crate provides the pure synchronization logic:
//! - Path normalization for index keys and wire paths
//! - CRC-64 content checksums
//! - Checksum index computation over a directory tree
//! - Tree diffing into push/delete sets and sync intents

pub mod diff;
pub mod hash;
pub mod index;
pub mod intent;
pub mod path;

// Re-export main types for convenience
pub use diff::TreeDiff;
pub use hash::{checksum_bytes, checksum_file, DIRECTORY_CHECKSUM};
pub use index::{ChecksumIndex, IndexError};
pub use intent::{IntentKind, SyncIntent};
pub use path::{normalize_path, normalize_wire_path, relative_key, PathError};
