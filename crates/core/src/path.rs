//! Path normalization
//!
//! Every path that crosses a component boundary (index keys, intents, wire
//! paths) is relative, `/`-separated, and carries no `./` prefix.

use std::path::{Component, Path};
use thiserror::Error;

/// Errors produced while normalizing a path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Absolute paths cannot be used as keys
    #[error("absolute path not allowed: {0}")]
    Absolute(String),

    /// `..` components could escape the sync root
    #[error("parent traversal not allowed: {0}")]
    ParentTraversal(String),

    /// Keys travel as JSON strings and URL segments
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(String),

    /// Path does not live beneath the sync root
    #[error("{path} is outside of {root}")]
    OutsideRoot { path: String, root: String },
}

/// Normalize a relative filesystem path into an index key
///
/// - Converts to a relative path with `/` separator
/// - Rejects `..` and absolute paths
/// - Removes `./` components
///
/// The empty path (or `.`) normalizes to the empty string, which denotes the root.
pub fn normalize_path(path: &Path) -> Result<String, PathError> {
    let mut parts = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PathError::NonUtf8(path.to_string_lossy().into_owned()))?;
                parts.push(part);
            }
            Component::ParentDir => {
                return Err(PathError::ParentTraversal(path.display().to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(path.display().to_string()));
            }
        }
    }

    Ok(parts.join("/"))
}

/// Normalize a path received over the wire
///
/// Leading, trailing and repeated separators are dropped, `.` segments are
/// skipped and `..` is rejected.
pub fn normalize_wire_path(raw: &str) -> Result<String, PathError> {
    let mut parts = Vec::new();

    for part in raw.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(PathError::ParentTraversal(raw.to_string())),
            part => parts.push(part),
        }
    }

    Ok(parts.join("/"))
}

/// Compute the normalized key of `path` relative to `root`
pub fn relative_key(root: &Path, path: &Path) -> Result<String, PathError> {
    let rel = path.strip_prefix(root).map_err(|_| PathError::OutsideRoot {
        path: path.display().to_string(),
        root: root.display().to_string(),
    })?;
    normalize_path(rel)
}
