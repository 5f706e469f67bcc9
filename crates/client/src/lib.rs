//! Synchronizing side of Treesync
//!
//! Runs an initial diff-based sync against the remote tree, then mirrors
//! every local filesystem change as it is observed.

pub mod config;
pub mod http;
pub mod reconcile;
pub mod sync;
pub mod transport;

pub use config::ClientConfig;
pub use http::HttpTransport;
pub use reconcile::Reconciler;
pub use sync::{SyncClient, SyncError, SyncReport};
pub use transport::{Transport, TransportError};
