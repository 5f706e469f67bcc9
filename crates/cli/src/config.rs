//! Configuration file parsing (treesync.toml)
//!
//! Every value can also be given on the command line; flags win over the
//! file, the file wins over defaults.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "treesync.toml";

/// Longest accepted coalescing window
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(10);

/// Contents of treesync.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub client: ClientSection,
    pub server: ServerSection,
    pub log: LogSection,
}

/// `[client]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
    /// Local tree to mirror
    pub root: Option<PathBuf>,
    /// Base URL of the remote server
    pub remote: Option<String>,
    /// Coalescing window in milliseconds (0 = every event applied individually)
    pub debounce_ms: Option<u64>,
    /// Seconds between full resynchronization passes (0 = disabled)
    pub reconcile_interval_secs: Option<u64>,
}

/// `[server]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Directory the remote tree is mirrored into
    pub root: Option<PathBuf>,
    /// Address to accept connections on
    pub listen: Option<SocketAddr>,
    /// Command run after every applied change
    pub command: Option<String>,
}

/// `[log]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl FileConfig {
    /// Load an explicitly named config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load `explicit` if given, otherwise treesync.toml from the working
    /// directory if present, otherwise defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Require a base URL the HTTP transport can talk to
pub fn validate_remote(remote: &str) -> Result<()> {
    let scheme = remote.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some("http") | Some("https") => Ok(()),
        _ => bail!("Remote URL must start with http:// or https://, got {:?}", remote),
    }
}

/// Require an existing directory and return its canonical form
///
/// Watch events carry paths built from the registered directories, so the
/// root is canonicalized once up front.
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    let canonical = root
        .canonicalize()
        .with_context(|| format!("Sync root {} does not exist", root.display()))?;
    if !canonical.is_dir() {
        bail!("Sync root {} is not a directory", root.display());
    }
    Ok(canonical)
}

/// Reject coalescing windows long enough to look like a hang
pub fn validate_debounce(window: Duration) -> Result<()> {
    if window > MAX_DEBOUNCE {
        bail!(
            "Debounce window {:?} exceeds the maximum of {:?}",
            window,
            MAX_DEBOUNCE
        );
    }
    Ok(())
}
