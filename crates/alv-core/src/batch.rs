//! Parses many ascensions in parallel on a bounded worker pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::game_data::GameData;
use crate::parser::{IngestError, LogParser};
use crate::preparsed::{is_preparsed_log, read_preparsed_file};
use crate::stitch::{StitchError, stitch_directory, write_all};
use crate::timeline::Timeline;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Stitch(#[from] StitchError),
    #[error("failed to build worker pool")]
    Pool(#[source] rayon::ThreadPoolBuildError),
    #[error("failed to create scratch directory {path}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Worker count; `None` uses one per core.
    pub worker_threads: Option<usize>,
    pub parse_notes: bool,
    /// Keep stitched files in the scratch directory after parsing.
    pub keep_scratch: bool,
}

#[derive(Debug)]
pub struct ParsedLog {
    pub file: PathBuf,
    pub timeline: Timeline,
}

/// One ascension that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFailure {
    pub file: PathBuf,
    pub last_turn: Option<u32>,
    pub message: String,
}

impl From<&IngestError> for LogFailure {
    fn from(err: &IngestError) -> Self {
        let message = match std::error::Error::source(err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };
        Self {
            file: err.path().to_path_buf(),
            last_turn: err.last_turn(),
            message,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully parsed logs, ordered by file path.
    pub parsed: Vec<ParsedLog>,
    pub failures: Vec<LogFailure>,
}

fn parse_one(path: &Path, parser: &LogParser<'_>) -> Result<Timeline, IngestError> {
    if is_preparsed_log(path) {
        read_preparsed_file(path)
    } else {
        parser.parse_file(path)
    }
}

/// Parses every file on a pool of `options.worker_threads` workers.
/// A failing file is reported and does not affect the others.
pub fn parse_files(
    files: &[PathBuf],
    data: &GameData,
    options: BatchOptions,
) -> Result<BatchReport, BatchError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = options.worker_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().map_err(BatchError::Pool)?;
    let parser = LogParser::new(data).with_notes(options.parse_notes);

    let results: Vec<(PathBuf, Result<Timeline, IngestError>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| (file.clone(), parse_one(file, &parser)))
            .collect()
    });

    let mut report = BatchReport::default();
    for (file, result) in results {
        match result {
            Ok(timeline) => report.parsed.push(ParsedLog { file, timeline }),
            Err(e) => {
                tracing::warn!(path = ?file, error = %e, "skipping unreadable log");
                report.failures.push(LogFailure::from(&e));
            }
        }
    }
    report.parsed.sort_by(|a, b| a.file.cmp(&b.file));

    tracing::info!(
        parsed = report.parsed.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

fn preparsed_logs_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_preparsed_log(path))
        .collect();
    logs.sort();
    logs
}

/// Stitches the daily logs in `log_dir` into `scratch_dir`, parses every
/// ascension plus any pre-parsed logs found alongside, then removes the
/// stitched files unless asked to keep them.
pub fn run(
    log_dir: &Path,
    scratch_dir: &Path,
    data: &GameData,
    options: BatchOptions,
) -> Result<BatchReport, BatchError> {
    let condensed = stitch_directory(log_dir)?;
    fs::create_dir_all(scratch_dir).map_err(|source| BatchError::Scratch {
        path: scratch_dir.to_path_buf(),
        source,
    })?;

    let mut files = write_all(&condensed, scratch_dir)?;
    files.extend(preparsed_logs_in(log_dir));
    tracing::info!(ascensions = files.len(), log_dir = %log_dir.display(), "parsing ascensions");

    let report = parse_files(&files, data, options);

    if !options.keep_scratch {
        for file in files.iter().filter(|f| f.starts_with(scratch_dir)) {
            if let Err(e) = fs::remove_file(file) {
                tracing::warn!(path = ?file, error = %e, "failed to remove stitched log");
            }
        }
    }
    report
}
