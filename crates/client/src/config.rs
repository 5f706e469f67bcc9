//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Everything the synchronizing side needs, passed in at construction
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Local tree to mirror
    pub root: PathBuf,
    /// Coalescing window for watch events; zero forwards every event as is
    pub debounce: Duration,
    /// Period of full resynchronization passes, if any
    pub reconcile_interval: Option<Duration>,
}

impl ClientConfig {
    /// Configuration with passthrough events and no reconciliation
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: Duration::ZERO,
            reconcile_interval: None,
        }
    }
}
