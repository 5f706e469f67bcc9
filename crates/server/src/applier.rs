//! Applies sync operations to the local tree
//!
//! Each operation touches only its own path and carries no state between
//! requests, so concurrent requests on disjoint paths are independent.
//! Requests racing on the same path are applied in service order.

use crate::command::PostSyncCommand;
use crate::config::ServerConfig;
use crate::error::ApplyError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use sync_core::{normalize_wire_path, ChecksumIndex};
use tracing::info;

/// Receiving end of the sync protocol
#[derive(Debug)]
pub struct ServerApplier {
    root: PathBuf,
    command: PostSyncCommand,
}

impl ServerApplier {
    /// Create an applier rooted at `root`
    pub fn new(root: impl Into<PathBuf>, command: PostSyncCommand) -> Self {
        Self {
            root: root.into(),
            command,
        }
    }

    /// Create an applier from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.root.clone(), config.command.clone())
    }

    /// Root of the mirrored tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checksum index of the subtree at `path`, keys relative to that subtree
    pub async fn index(&self, path: &str) -> Result<ChecksumIndex, ApplyError> {
        let (rel, full) = self.resolve(path)?;
        if tokio::fs::metadata(&full).await.is_err() {
            return Err(ApplyError::NotFound(rel));
        }

        let index = tokio::task::spawn_blocking(move || ChecksumIndex::compute(&full)).await??;
        Ok(index)
    }

    /// Write file content at `path`, replacing a directory if one is there
    pub async fn write_file(&self, path: &str, content: Vec<u8>) -> Result<String, ApplyError> {
        let (rel, full) = self.resolve_mutable(path)?;

        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_dir() => {
                tokio::fs::remove_dir_all(&full)
                    .await
                    .map_err(ApplyError::io(&full))?;
            }
            _ => {
                if let Some(parent) = full.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(ApplyError::io(parent))?;
                }
            }
        }

        let target = full.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &content))
            .await?
            .map_err(ApplyError::io(&full))?;

        info!("Wrote {}", rel);
        self.command.run(&self.root).await
    }

    /// Ensure a directory exists at `path`, replacing a file if one is there
    pub async fn ensure_directory(&self, path: &str) -> Result<String, ApplyError> {
        let (rel, full) = self.resolve_mutable(path)?;

        if let Ok(meta) = tokio::fs::symlink_metadata(&full).await {
            if !meta.is_dir() {
                tokio::fs::remove_file(&full)
                    .await
                    .map_err(ApplyError::io(&full))?;
            }
        }

        tokio::fs::create_dir_all(&full)
            .await
            .map_err(ApplyError::io(&full))?;

        info!("Created directory {}", rel);
        self.command.run(&self.root).await
    }

    /// Remove whatever exists at `path`, recursively for directories
    pub async fn remove(&self, path: &str) -> Result<String, ApplyError> {
        let (rel, full) = self.resolve_mutable(path)?;

        let meta = match tokio::fs::symlink_metadata(&full).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ApplyError::NotFound(rel)),
            Err(e) => return Err(ApplyError::io(&full)(e)),
        };

        if meta.is_dir() {
            tokio::fs::remove_dir_all(&full).await
        } else {
            tokio::fs::remove_file(&full).await
        }
        .map_err(ApplyError::io(&full))?;

        info!("Removed {}", rel);
        self.command.run(&self.root).await
    }

    /// Normalize a wire path and join it onto the root
    fn resolve(&self, path: &str) -> Result<(String, PathBuf), ApplyError> {
        let rel = normalize_wire_path(path)?;
        let full = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&rel)
        };
        Ok((rel, full))
    }

    /// Like `resolve`, but the root itself is off limits
    fn resolve_mutable(&self, path: &str) -> Result<(String, PathBuf), ApplyError> {
        let (rel, full) = self.resolve(path)?;
        if rel.is_empty() {
            return Err(ApplyError::RootMutation);
        }
        Ok((rel, full))
    }
}

/// Atomic write helper
///
/// Writes data to a temporary file next to the target, fsyncs it, then
/// renames it over the target so readers never see a half-written file.
pub fn atomic_write(target: &Path, data: &[u8]) -> io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(".treesync-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create would get, before umask
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut tmp = builder.tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
