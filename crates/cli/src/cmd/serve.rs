//! Run the receiving side

use crate::config::{validate_root, ServerSection};
use anyhow::{Context, Result};
use server::config::DEFAULT_LISTEN;
use server::{PostSyncCommand, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Flag values; `None` falls back to the config file, then defaults
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub root: Option<PathBuf>,
    pub listen: Option<SocketAddr>,
    pub command: Option<String>,
}

pub async fn run(options: ServeOptions, file: &ServerSection) -> Result<()> {
    let config = resolve(options, file)?;
    if config.command.is_empty() {
        info!("No post-sync command configured");
    } else {
        info!("Post-sync command: {}", config.command);
    }

    server::serve(config).await.context("Server failed")
}

/// Merge flags, file and defaults into a server configuration
pub fn resolve(options: ServeOptions, file: &ServerSection) -> Result<ServerConfig> {
    let root = options
        .root
        .or_else(|| file.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let listen = match options.listen.or(file.listen) {
        Some(listen) => listen,
        None => DEFAULT_LISTEN.parse().context("Invalid default listen address")?,
    };
    let command = options
        .command
        .or_else(|| file.command.clone())
        .map(|line| PostSyncCommand::parse(&line))
        .unwrap_or_default();

    Ok(ServerConfig {
        root: validate_root(&root)?,
        listen,
        command,
    })
}
