//! Translation of raw watch events into sync intents

use crate::registry::{WatchBackend, WatchRegistry};
use crate::{EventKind, WatchError, WatchEvent};
use std::path::PathBuf;
use sync_core::{relative_key, SyncIntent};
use tracing::debug;

/// Maps one filesystem notification to the remote actions it requires
///
/// Events are translated one at a time in arrival order; nothing is
/// reordered, deduplicated or coalesced here.
pub struct EventTranslator {
    root: PathBuf,
}

impl EventTranslator {
    /// Create a translator for events under `root`
    ///
    /// `root` must be spelled exactly as it was handed to the registry, since
    /// event paths are built from the registered directory paths.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Translate one event
    ///
    /// A directory that shows up is registered recursively before its push
    /// intent is emitted, so descendants created in the same burst are seen by
    /// later events. A registration failure is returned and no intent is
    /// produced for that event.
    pub fn translate<B: WatchBackend>(
        &self,
        event: &WatchEvent,
        registry: &mut WatchRegistry<B>,
    ) -> Result<Vec<SyncIntent>, WatchError> {
        let key = match relative_key(&self.root, &event.path) {
            Ok(key) if !key.is_empty() => key,
            Ok(_) => {
                debug!("Ignoring event on sync root: {:?}", event.kind);
                return Ok(Vec::new());
            }
            Err(e) => {
                debug!("Ignoring event outside sync root: {}", e);
                return Ok(Vec::new());
            }
        };

        match event.kind {
            EventKind::Create | EventKind::Modify => {
                if event.path.is_dir() {
                    registry.register_recursive(&event.path)?;
                    Ok(vec![SyncIntent::push_directory(key)])
                } else {
                    // Also covers paths that vanished before we looked; the
                    // push fails and is logged by the applier
                    Ok(vec![SyncIntent::push_file(key)])
                }
            }
            EventKind::Delete | EventKind::Rename => {
                registry.forget(&event.path);
                Ok(vec![SyncIntent::delete(key)])
            }
        }
    }
}
