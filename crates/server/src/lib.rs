//! Receiving side of Treesync
//!
//! Applies pushes and deletes to a local tree over HTTP and runs the
//! post-sync command after every successful change.

pub mod applier;
pub mod command;
pub mod config;
pub mod error;
pub mod routes;

pub use applier::ServerApplier;
pub use command::PostSyncCommand;
pub use config::ServerConfig;
pub use error::ApplyError;
pub use routes::{router, serve, serve_on};
