//! Sync orchestration
//!
//! Phase 1 diffs the local tree against the remote index and applies the
//! result. Phase 2 registers watches over the root and applies intents for
//! every event, one round trip at a time and in arrival order. A failed
//! intent is logged and skipped; there is no retry.

use crate::config::ClientConfig;
use crate::reconcile::Reconciler;
use crate::transport::{Transport, TransportError};
use std::io;
use std::path::{Path, PathBuf};
use sync_core::{ChecksumIndex, IndexError, IntentKind, SyncIntent, TreeDiff};
use thiserror::Error;
use tokio::fs::File;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, error, info, warn};
use watcher::{
    stage_for, EventTranslator, NotifyBackend, WatchBackend, WatchError, WatchEvent, WatchMessage,
    WatchRegistry,
};

/// Sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local tree could not be indexed completely
    #[error("failed to index local tree: {0}")]
    Index(#[from] IndexError),

    /// A file to push could not be opened
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of applying a batch of intents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Pushes that succeeded
    pub pushed: usize,
    /// Deletes that succeeded
    pub deleted: usize,
    /// Intents that failed and were skipped
    pub failed: usize,
}

impl SyncReport {
    fn record(&mut self, intent: &SyncIntent, ok: bool) {
        match (ok, intent.kind) {
            (false, _) => self.failed += 1,
            (true, IntentKind::Push) => self.pushed += 1,
            (true, IntentKind::Delete) => self.deleted += 1,
        }
    }

    fn merge(&mut self, other: SyncReport) {
        self.pushed += other.pushed;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}

/// Drives a local tree towards a remote one through a transport
pub struct SyncClient<T: Transport> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> SyncClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Local sync root
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run both phases until the process is terminated
    ///
    /// A failed initial sync is logged and does not prevent watching. Failing
    /// to register the root watches is fatal.
    pub async fn run(&self) -> Result<(), SyncError> {
        if let Err(e) = self.initial_sync().await {
            error!("Initial sync failed: {}", e);
        }

        let (tx, rx) = unbounded_channel();
        let mut registry = WatchRegistry::new(NotifyBackend::new(tx)?);
        let watched = registry.register_recursive(&self.config.root)?;
        info!(
            "Watching {} directories under {}",
            watched,
            self.config.root.display()
        );

        let events = stage_for(self.config.debounce).attach(rx);
        self.watch(&mut registry, events).await
    }

    /// Compute the local index and diff it against the remote one
    pub async fn diff(&self) -> Result<TreeDiff, SyncError> {
        let root = self.config.root.clone();
        let local = tokio::task::spawn_blocking(move || ChecksumIndex::compute(&root)).await??;
        let remote = self.transport.fetch_index().await?;

        Ok(TreeDiff::diff(&local, remote))
    }

    /// Phase 1: full diff-based sync
    ///
    /// Errors from indexing or fetching the remote index abort the pass.
    /// Individual intent failures are logged and counted in the report.
    pub async fn initial_sync(&self) -> Result<SyncReport, SyncError> {
        let diff = self.diff().await?;
        info!(
            "Sync pass: {} to push, {} to delete",
            diff.push.len(),
            diff.delete.len()
        );

        let mut report = SyncReport::default();
        for intent in diff.intents() {
            let ok = self.apply_logged(&intent).await;
            report.record(&intent, ok);
        }

        if report.failed > 0 {
            warn!("Sync pass finished with {} failures", report.failed);
        }
        Ok(report)
    }

    /// Phase 2: apply intents for every watch event until the stream ends
    ///
    /// `registry` must already cover the root. Registration failures for new
    /// subdirectories are logged; the loop keeps going.
    pub async fn watch<B: WatchBackend>(
        &self,
        registry: &mut WatchRegistry<B>,
        mut events: UnboundedReceiver<WatchMessage>,
    ) -> Result<(), SyncError> {
        let translator = EventTranslator::new(&self.config.root);
        let mut reconciler = Reconciler::new(self.config.reconcile_interval);

        loop {
            tokio::select! {
                biased;

                message = events.recv() => match message {
                    Some(WatchMessage::Event(event)) => {
                        self.handle_event(&translator, registry, &event).await;
                    }
                    Some(WatchMessage::Error(e)) => warn!("Watch error: {}", e),
                    None => {
                        info!("Watch stream closed");
                        return Ok(());
                    }
                },

                _ = reconciler.tick() => self.reconcile(registry).await,
            }
        }
    }

    /// Translate and apply one event
    pub async fn handle_event<B: WatchBackend>(
        &self,
        translator: &EventTranslator,
        registry: &mut WatchRegistry<B>,
        event: &WatchEvent,
    ) -> SyncReport {
        debug!("{:?} {}", event.kind, event.path.display());

        let mut report = SyncReport::default();
        let intents = match translator.translate(event, registry) {
            Ok(intents) => intents,
            Err(e) => {
                warn!("Failed to register {}: {}", event.path.display(), e);
                report.failed += 1;
                return report;
            }
        };

        for intent in intents {
            let ok = self.apply_logged(&intent).await;
            report.record(&intent, ok);
        }
        report
    }

    /// Re-cover the whole root and run a full diff pass
    async fn reconcile<B: WatchBackend>(&self, registry: &mut WatchRegistry<B>) {
        let mut report = SyncReport::default();

        match registry.register_recursive(&self.config.root) {
            Ok(0) => {}
            Ok(added) => info!("Reconciliation registered {} missed directories", added),
            Err(e) => {
                warn!("Reconciliation could not register watches: {}", e);
                report.failed += 1;
            }
        }

        match self.initial_sync().await {
            Ok(pass) => report.merge(pass),
            Err(e) => warn!("Reconciliation pass failed: {}", e),
        }

        if report.pushed + report.deleted > 0 {
            info!(
                "Reconciliation caught {} missed changes",
                report.pushed + report.deleted
            );
        }
    }

    /// Apply one intent through the transport, returning the remote output
    pub async fn apply(&self, intent: &SyncIntent) -> Result<String, SyncError> {
        let output = match (intent.kind, intent.is_directory) {
            (IntentKind::Push, true) => self.transport.push_directory(&intent.path).await?,
            (IntentKind::Push, false) => {
                let path = self.config.root.join(&intent.path);
                let file = File::open(&path)
                    .await
                    .map_err(|source| SyncError::Read { path, source })?;
                self.transport.push_file(&intent.path, file).await?
            }
            (IntentKind::Delete, _) => self.transport.delete(&intent.path).await?,
        };
        Ok(output)
    }

    /// Apply one intent, logging the outcome with its path
    async fn apply_logged(&self, intent: &SyncIntent) -> bool {
        match self.apply(intent).await {
            Ok(output) => {
                info!("{}", intent);
                let output = output.trim_end();
                if !output.is_empty() {
                    info!("{}", output);
                }
                true
            }
            Err(e) => {
                warn!("Failed to {}: {}", intent, e);
                false
            }
        }
    }
}
