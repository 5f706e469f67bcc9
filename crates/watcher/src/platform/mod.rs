//! OS file watching through `notify`
//!
//! Watches are registered one directory at a time (non-recursive), and every
//! notification or backend error lands on a single unbounded channel in the
//! order the OS reported it.

use crate::registry::WatchBackend;
use crate::{EventKind, WatchError, WatchEvent, WatchMessage};
use notify::event::{EventKind as NotifyKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc::UnboundedSender;

/// Watch backend driven by the platform's recommended notify watcher
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl NotifyBackend {
    /// Create a watcher that forwards everything into `tx`
    pub fn new(tx: UnboundedSender<WatchMessage>) -> Result<Self, WatchError> {
        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => {
                    for event in map_event(event) {
                        let _ = tx.send(WatchMessage::Event(event));
                    }
                }
                Err(err) => {
                    let _ = tx.send(WatchMessage::Error(err));
                }
            }
        })
        .map_err(WatchError::Init)?;

        Ok(Self { watcher })
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: dir.to_path_buf(),
                source,
            })
    }

    fn unwatch(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher.unwatch(dir).map_err(|source| WatchError::Register {
            path: dir.to_path_buf(),
            source,
        })
    }
}

/// Map a notify event onto zero or more watch events
pub fn map_event(event: notify::Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        NotifyKind::Create(_) => EventKind::Create,
        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => EventKind::Rename,
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => EventKind::Create,
        // Backends that pair renames also emit the From and To halves
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
        // Unpaired renames (FSEvents): whichever side still exists was the target
        NotifyKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .into_iter()
                .map(|path| {
                    let kind = if path.exists() {
                        EventKind::Create
                    } else {
                        EventKind::Rename
                    };
                    WatchEvent { path, kind }
                })
                .collect();
        }
        NotifyKind::Modify(_) => EventKind::Modify,
        NotifyKind::Remove(_) => EventKind::Delete,
        NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| WatchEvent { path, kind })
        .collect()
}
