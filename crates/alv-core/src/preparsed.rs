//! Reader for finished logs that were already condensed to one line per
//! area visit, `[N] AREA` or `[N-M] AREA`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parser::IngestError;
use crate::patterns::{DAY_CHANGE, PREPARSED_INTERVAL, PREPARSED_MARKER};
use crate::timeline::Timeline;
use crate::turn::TurnInterval;
use crate::types::Username;

/// Whether a file name looks like a pre-parsed log.
pub fn is_preparsed_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(PREPARSED_MARKER))
}

fn username_of(path: &Path) -> Option<Username> {
    let name = path.file_name()?.to_str()?;
    let (username, _) = name.split_once(PREPARSED_MARKER)?;
    Username::new(username).ok()
}

fn read_line(line: &str, timeline: &mut Timeline) {
    if let Some(caps) = DAY_CHANGE.captures(line) {
        if let Ok(day) = caps[1].parse() {
            let turn = timeline.last_turn_number();
            timeline.add_day_change(day, turn);
        }
        return;
    }
    let Some(caps) = PREPARSED_INTERVAL.captures(line) else {
        if !line.trim().is_empty() {
            tracing::trace!(line, "unrecognized pre-parsed line");
        }
        return;
    };
    let Ok(first) = caps[1].parse::<u32>() else {
        return;
    };
    let last = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(first);
    if first == 0 || last < first {
        tracing::debug!(line, "malformed turn range, skipped");
        return;
    }
    timeline.add_interval(TurnInterval::aggregated(first - 1, last, &caps[3]));
}

/// Reads a pre-parsed log from any buffered reader.
pub fn read_preparsed<R: BufRead>(source: &Path, reader: R) -> Result<Timeline, IngestError> {
    let name = source
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let mut timeline = Timeline::new(name);
    if let Some(username) = username_of(source) {
        timeline.set_username(username);
    }

    for line in reader.lines() {
        let line = line.map_err(|source_err| IngestError::Read {
            path: source.to_path_buf(),
            last_turn: timeline.last_turn_number(),
            source: source_err,
        })?;
        read_line(&line, &mut timeline);
    }

    tracing::debug!(
        log = %source.display(),
        intervals = timeline.intervals().len(),
        "pre-parsed log read"
    );
    Ok(timeline)
}

pub fn read_preparsed_file(path: &Path) -> Result<Timeline, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_preparsed(path, BufReader::new(file))
}
