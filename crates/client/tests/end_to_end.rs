//! Client and server talking over a real socket

use anyhow::Result;
use client::{ClientConfig, HttpTransport, SyncClient, SyncReport, Transport};
use server::{serve_on, PostSyncCommand, ServerApplier};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use sync_core::ChecksumIndex;
use tokio::net::TcpListener;
use tokio::sync::mpsc::unbounded_channel;
use watcher::{EventKind, WatchBackend, WatchError, WatchEvent, WatchMessage, WatchRegistry};

struct NullBackend;

impl WatchBackend for NullBackend {
    fn watch(&mut self, _dir: &Path) -> Result<(), WatchError> {
        Ok(())
    }

    fn unwatch(&mut self, _dir: &Path) -> Result<(), WatchError> {
        Ok(())
    }
}

/// Start a server over `remote` and return a client for `local`
async fn pair(local: &Path, remote: &Path) -> Result<SyncClient<HttpTransport>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let applier = Arc::new(ServerApplier::new(remote, PostSyncCommand::default()));
    tokio::spawn(serve_on(listener, applier));

    let transport = HttpTransport::new(&format!("http://{addr}"))?;
    Ok(SyncClient::new(ClientConfig::new(local), transport))
}

#[tokio::test]
async fn test_initial_sync_then_delete_event() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    fs::write(local.path().join("x.txt"), b"forty-two")?;

    let client = pair(local.path(), remote.path()).await?;

    let report = client.initial_sync().await?;
    assert_eq!(report, SyncReport { pushed: 1, deleted: 0, failed: 0 });
    assert_eq!(fs::read(remote.path().join("x.txt"))?, b"forty-two");

    fs::remove_file(local.path().join("x.txt"))?;
    let mut registry = WatchRegistry::new(NullBackend);
    registry.register_recursive(local.path())?;
    let (tx, rx) = unbounded_channel();
    tx.send(WatchMessage::Event(WatchEvent::new(
        local.path().join("x.txt"),
        EventKind::Delete,
    )))?;
    drop(tx);

    client.watch(&mut registry, rx).await?;

    assert!(!remote.path().join("x.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_second_sync_is_empty() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    fs::create_dir_all(local.path().join("src/pkg"))?;
    fs::create_dir_all(local.path().join("empty"))?;
    fs::write(local.path().join("src/main.go"), b"package main")?;
    fs::write(local.path().join("src/pkg/lib.go"), b"package pkg")?;
    fs::write(remote.path().join("stale.txt"), b"old")?;

    let client = pair(local.path(), remote.path()).await?;

    let first = client.initial_sync().await?;
    assert_eq!(first, SyncReport { pushed: 5, deleted: 1, failed: 0 });

    let diff = client.diff().await?;
    assert!(diff.is_empty(), "{diff:?}");

    let second = client.initial_sync().await?;
    assert_eq!(second, SyncReport::default());

    assert_eq!(
        ChecksumIndex::compute(local.path())?,
        ChecksumIndex::compute(remote.path())?
    );
    Ok(())
}

#[tokio::test]
async fn test_type_change_is_mirrored() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    fs::create_dir_all(remote.path().join("thing/inner"))?;
    fs::write(remote.path().join("thing/inner/f"), b"f")?;
    fs::write(local.path().join("thing"), b"now a file")?;

    let client = pair(local.path(), remote.path()).await?;
    let report = client.initial_sync().await?;

    assert_eq!(report.failed, 0);
    assert_eq!(fs::read(remote.path().join("thing"))?, b"now a file");
    assert!(client.diff().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fetch_index_over_http() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    fs::create_dir(remote.path().join("d"))?;
    fs::write(remote.path().join("d/file"), b"content")?;

    let client = pair(local.path(), remote.path()).await?;
    let index = client.transport().fetch_index().await?;

    assert_eq!(index.get("d/"), Some(0));
    assert_eq!(index.get("d/file"), Some(sync_core::checksum_bytes(b"content")));
    assert_eq!(index.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_remote_errors_are_isolated() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    let client = pair(local.path(), remote.path()).await?;

    // Nothing to delete remotely: 404, logged and counted
    let mut registry = WatchRegistry::new(NullBackend);
    registry.register_recursive(local.path())?;
    fs::write(local.path().join("after.txt"), b"still synced")?;

    let (tx, rx) = unbounded_channel();
    tx.send(WatchMessage::Event(WatchEvent::new(
        local.path().join("never-existed"),
        EventKind::Delete,
    )))?;
    tx.send(WatchMessage::Event(WatchEvent::new(
        local.path().join("after.txt"),
        EventKind::Create,
    )))?;
    drop(tx);

    client.watch(&mut registry, rx).await?;

    assert_eq!(fs::read(remote.path().join("after.txt"))?, b"still synced");
    Ok(())
}

#[tokio::test]
async fn test_large_file_arrives_intact() -> Result<()> {
    let local = tempfile::tempdir()?;
    let remote = tempfile::tempdir()?;
    // Several read buffers' worth, and above axum's default body limit
    let content: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    fs::write(local.path().join("blob.bin"), &content)?;

    let client = pair(local.path(), remote.path()).await?;
    let report = client.initial_sync().await?;

    assert_eq!(report, SyncReport { pushed: 1, deleted: 0, failed: 0 });
    assert_eq!(fs::read(remote.path().join("blob.bin"))?, content);
    Ok(())
}
