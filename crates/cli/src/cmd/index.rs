//! Print the checksum index of a local tree

use anyhow::{Context, Result};
use std::path::Path;
use sync_core::ChecksumIndex;

pub fn run(path: &Path) -> Result<()> {
    let index = ChecksumIndex::compute(path)
        .with_context(|| format!("Failed to index {}", path.display()))?;
    println!("{}", index.to_json_pretty()?);
    Ok(())
}
