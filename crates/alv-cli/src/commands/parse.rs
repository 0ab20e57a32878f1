//! Parse command: summarizes individual ascension logs.
//!
//! Stitched logs go through the block parser; `_ascend` files are read as
//! pre-parsed interval lists.

use std::path::{Path, PathBuf};

use alv_core::preparsed::{is_preparsed_log, read_preparsed_file};
use alv_core::{GameData, LogParser, Timeline};
use anyhow::{Context, Result};

use super::report::{SummaryEntry, format_summary};

fn read_log(path: &Path, parser: &LogParser<'_>) -> Result<Timeline> {
    let timeline = if is_preparsed_log(path) {
        read_preparsed_file(path)
    } else {
        parser.parse_file(path)
    };
    timeline.with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses every file in order; the first unreadable file aborts the command.
pub fn run(files: &[PathBuf], json: bool, parse_notes: bool) -> Result<()> {
    let data = GameData::bundled();
    let parser = LogParser::new(data).with_notes(parse_notes);

    let timelines = files
        .iter()
        .map(|path| read_log(path, &parser))
        .collect::<Result<Vec<_>>>()?;

    if json {
        let entries: Vec<SummaryEntry<'_>> = timelines
            .iter()
            .map(|timeline| SummaryEntry {
                log: timeline.name(),
                summary: timeline.summary(data),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (i, timeline) in timelines.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print!("{}", format_summary(timeline.name(), timeline.summary(data)));
        }
    }
    Ok(())
}
