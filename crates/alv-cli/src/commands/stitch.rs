//! Stitch command: writes one condensed log per ascension.

use std::path::Path;

use alv_core::stitch::{stitch_directory, write_all};
use anyhow::{Context, Result};

pub fn run(dir: &Path, out: Option<&Path>) -> Result<()> {
    let out = out.unwrap_or(dir);
    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let condensed = stitch_directory(dir)
        .with_context(|| format!("failed to stitch logs in {}", dir.display()))?;
    let written = write_all(&condensed, out).context("failed to write stitched logs")?;
    for path in &written {
        println!("{}", path.display());
    }
    tracing::debug!(written = condensed.len(), "stitch complete");
    Ok(())
}
