//! Batch command: stitches and parses a whole log directory.

use std::path::Path;

use alv_core::batch::{self, BatchOptions};
use alv_core::GameData;
use anyhow::{Context, Result};
use serde::Serialize;

use super::report::{FailureEntry, SummaryEntry, format_failures, format_summary};
use crate::Config;

#[derive(Debug, Serialize)]
struct BatchOutput<'a> {
    ascensions: Vec<SummaryEntry<'a>>,
    failures: Vec<FailureEntry<'a>>,
}

pub fn run(dir: &Path, json: bool, keep: bool, config: &Config) -> Result<()> {
    let data = GameData::bundled();
    let options = BatchOptions {
        worker_threads: config.worker_threads,
        parse_notes: config.parse_notes,
        keep_scratch: keep,
    };

    let report = batch::run(dir, &config.scratch_dir, data, options)
        .with_context(|| format!("failed to process logs in {}", dir.display()))?;

    if json {
        let output = BatchOutput {
            ascensions: report
                .parsed
                .iter()
                .map(|log| SummaryEntry {
                    log: log.timeline.name(),
                    summary: log.timeline.summary(data),
                })
                .collect(),
            failures: report.failures.iter().map(FailureEntry::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (i, log) in report.parsed.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", format_summary(log.timeline.name(), log.timeline.summary(data)));
    }
    if !report.failures.is_empty() {
        println!();
        print!("{}", format_failures(&report.failures));
    }
    if keep {
        println!();
        println!("Stitched logs kept in {}", config.scratch_dir.display());
    }
    Ok(())
}
