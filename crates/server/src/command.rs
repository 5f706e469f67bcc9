//! Post-sync command hook

use crate::error::ApplyError;
use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Command run after every applied change
///
/// Parsed by splitting on whitespace into a program and its arguments; no
/// shell is involved. An empty command is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSyncCommand {
    argv: Vec<String>,
}

impl PostSyncCommand {
    /// Parse a command line such as `go build ./...`
    pub fn parse(line: &str) -> Self {
        Self {
            argv: line.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Whether there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Run the command in `cwd`, returning stdout followed by stderr
    pub async fn run(&self, cwd: &Path) -> Result<String, ApplyError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Ok(String::new());
        };

        debug!("Running `{}` in {}", self, cwd.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .await
            .map_err(|e| ApplyError::Command {
                command: self.to_string(),
                message: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ApplyError::Command {
                command: self.to_string(),
                message: format!("{}\n{}", output.status, combined.trim_end()),
            });
        }

        Ok(combined)
    }
}

impl fmt::Display for PostSyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}
