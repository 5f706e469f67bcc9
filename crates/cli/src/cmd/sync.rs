//! Run the synchronizing side

use crate::config::{validate_debounce, validate_remote, validate_root, ClientSection};
use anyhow::{Context, Result};
use client::{ClientConfig, HttpTransport, SyncClient};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Flag values; `None` falls back to the config file, then defaults
#[derive(Debug, Default)]
pub struct SyncOptions {
    pub root: Option<PathBuf>,
    pub remote: Option<String>,
    pub debounce_ms: Option<u64>,
    pub reconcile_interval_secs: Option<u64>,
    /// Run the initial sync only, then exit
    pub once: bool,
}

pub async fn run(options: SyncOptions, file: &ClientSection) -> Result<()> {
    let once = options.once;
    let (config, remote) = resolve(options, file)?;
    let client = SyncClient::new(config, HttpTransport::new(&remote)?);
    info!(
        "Syncing {} to {}",
        client.root().display(),
        client.transport().base()
    );

    if once {
        let report = client.initial_sync().await?;
        info!(
            "Pushed {}, deleted {}, failed {}",
            report.pushed, report.deleted, report.failed
        );
        if report.failed > 0 {
            anyhow::bail!("{} operations failed", report.failed);
        }
        return Ok(());
    }

    client.run().await.context("Sync stopped")
}

/// Merge flags, file and defaults into a client configuration and remote URL
pub fn resolve(options: SyncOptions, file: &ClientSection) -> Result<(ClientConfig, String)> {
    let remote = options
        .remote
        .or_else(|| file.remote.clone())
        .context("No remote given: pass --remote or set client.remote in treesync.toml")?;
    validate_remote(&remote)?;

    let root = options
        .root
        .or_else(|| file.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let debounce = Duration::from_millis(options.debounce_ms.or(file.debounce_ms).unwrap_or(0));
    validate_debounce(debounce)?;

    let reconcile_interval = options
        .reconcile_interval_secs
        .or(file.reconcile_interval_secs)
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs);

    let config = ClientConfig {
        root: validate_root(&root)?,
        debounce,
        reconcile_interval,
    };
    Ok((config, remote))
}
