//! Treesync CLI - treesync command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

mod cmd;
mod config;
mod logging;

use cmd::serve::ServeOptions;
use cmd::sync::SyncOptions;
use config::FileConfig;

/// Treesync - mirror a directory tree to a build host
#[derive(Parser)]
#[command(name = "treesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: treesync.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive changes into a directory and run a command after each one
    Serve {
        /// Directory to mirror into (default: .)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Address to listen on (default: 0.0.0.0:8080)
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Command run in the root after every change, e.g. "go build"
        #[arg(long, alias = "cmd")]
        command: Option<String>,
    },
    /// Push a directory to a server and keep it in sync
    Sync {
        /// Base URL of the server, e.g. http://build-host:8080/
        #[arg(long, alias = "to")]
        remote: Option<String>,
        /// Directory to mirror (default: .)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Coalesce events within this many milliseconds (default: 0, off)
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Run a full resync every this many seconds (default: 0, off)
        #[arg(long)]
        reconcile_interval_secs: Option<u64>,
        /// Run the initial sync and exit instead of watching
        #[arg(long)]
        once: bool,
    },
    /// Print the checksum index of a directory as JSON
    Index {
        /// Directory to index
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = FileConfig::discover(cli.config.as_deref())?;
    let log_file = cli.log_file.or_else(|| file.log.file.clone());
    let _guard = logging::init(log_file.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Serve { root, listen, command } => {
            cmd::serve::run(ServeOptions { root, listen, command }, &file.server).await
        }
        Commands::Sync { remote, root, debounce_ms, reconcile_interval_secs, once } => {
            let options = SyncOptions {
                root,
                remote,
                debounce_ms,
                reconcile_interval_secs,
                once,
            };
            cmd::sync::run(options, &file.client).await
        }
        Commands::Index { path } => cmd::index::run(&path),
    }
}
