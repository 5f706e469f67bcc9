//! Server configuration

use crate::command::PostSyncCommand;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Everything the receiving side needs, passed in at construction
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory the remote tree is mirrored into
    pub root: PathBuf,
    /// Address to accept connections on
    pub listen: SocketAddr,
    /// Command run after every applied change
    pub command: PostSyncCommand,
}
