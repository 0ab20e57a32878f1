//! Joins daily session logs into one condensed log per ascension.
//!
//! Day boundaries come from the dates in the daily file names plus any date
//! change claimed inside a file. An ascend confirmation ends the current
//! ascension mid-file.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::patterns::{ASCEND_CONFIRMATION, DAILY_LOG_FILE, DATE_STAMP, PREPARSED_MARKER};

#[derive(Debug, Error)]
pub enum StitchError {
    #[error("log directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("no daily session logs in {0}")]
    NoLogs(PathBuf),
    #[error("no daily session logs given")]
    EmptyInput,
    #[error("not a daily session log name: {0}")]
    InvalidFileName(PathBuf),
    #[error("failed to list {path}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StitchError {
    /// The file or directory the error is about.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingDirectory(path)
            | Self::NoLogs(path)
            | Self::InvalidFileName(path)
            | Self::ListDirectory { path, .. }
            | Self::Read { path, .. }
            | Self::Write { path, .. } => Some(path),
            Self::EmptyInput => None,
        }
    }
}

/// An unparsed daily log, `USERNAME_YYYYMMDD.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    pub path: PathBuf,
    pub username: String,
    pub date: NaiveDate,
}

impl DailyLog {
    /// Reads username and date from the file name.
    pub fn from_path(path: &Path) -> Result<Self, StitchError> {
        let invalid = || StitchError::InvalidFileName(path.to_path_buf());
        let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
        if file_name.contains(PREPARSED_MARKER) {
            return Err(invalid());
        }
        let caps = DAILY_LOG_FILE.captures(file_name).ok_or_else(invalid)?;
        let date = NaiveDate::parse_from_str(&caps[2], "%Y%m%d").map_err(|_| invalid())?;
        Ok(Self {
            path: path.to_path_buf(),
            username: caps[1].to_string(),
            date,
        })
    }
}

/// One ascension's worth of log text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedLog {
    pub username: String,
    pub start_date: NaiveDate,
    pub text: String,
}

impl CondensedLog {
    /// `USERNAME-YYYYMMDD.txt`
    pub fn file_name(&self) -> String {
        format!("{}-{}.txt", self.username, self.start_date.format("%Y%m%d"))
    }

    /// `USERNAME-YYYYMMDD-N.txt`, the name of the Nth ascension started on
    /// the same day; the first keeps the plain name.
    pub fn numbered_file_name(&self, sequence: u32) -> String {
        if sequence <= 1 {
            return self.file_name();
        }
        format!(
            "{}-{}-{sequence}.txt",
            self.username,
            self.start_date.format("%Y%m%d")
        )
    }

    /// Writes the log into `dir`, returning the written path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, StitchError> {
        self.write_as(dir, &self.file_name())
    }

    fn write_as(&self, dir: &Path, file_name: &str) -> Result<PathBuf, StitchError> {
        let path = dir.join(file_name);
        fs::write(&path, &self.text).map_err(|source| StitchError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Writes every log into `dir`. Ascensions of one player that start on the
/// same day are numbered so none overwrites another.
pub fn write_all(logs: &[CondensedLog], dir: &Path) -> Result<Vec<PathBuf>, StitchError> {
    let mut seen: HashMap<(&str, NaiveDate), u32> = HashMap::new();
    let mut written = Vec::with_capacity(logs.len());
    for log in logs {
        let sequence = seen.entry((log.username.as_str(), log.start_date)).or_insert(0);
        *sequence += 1;
        written.push(log.write_as(dir, &log.numbered_file_name(*sequence))?);
    }
    Ok(written)
}

fn claimed_date(line: &str) -> Option<NaiveDate> {
    let caps = DATE_STAMP.captures(line)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = 2000 + caps[3].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug)]
struct Stream {
    username: String,
    start_date: NaiveDate,
    date: NaiveDate,
    day: u32,
    text: String,
}

impl Stream {
    const fn new(username: String, date: NaiveDate) -> Self {
        Self {
            username,
            start_date: date,
            date,
            day: 1,
            text: String::new(),
        }
    }

    fn next_day(&mut self) {
        self.day += 1;
        // Writing to a String cannot fail.
        let _ = write!(self.text, "===Day {}===\n\n", self.day);
    }

    fn advance_to(&mut self, date: NaiveDate) {
        let delta = (date - self.date).num_days();
        for _ in 0..delta.max(0) {
            self.next_day();
        }
        self.date = self.date.max(date);
    }

    fn has_content(&self) -> bool {
        self.text.lines().any(|line| !line.trim().is_empty())
    }
}

/// Incremental stitcher; daily logs are pushed in chronological order.
#[derive(Debug, Default)]
pub struct Stitcher {
    finished: Vec<CondensedLog>,
    current: Option<Stream>,
}

impl Stitcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn close(&mut self) {
        if let Some(stream) = self.current.take() {
            if stream.has_content() {
                self.finished.push(CondensedLog {
                    username: stream.username,
                    start_date: stream.start_date,
                    text: stream.text,
                });
            } else {
                tracing::debug!(username = %stream.username, "dropping empty ascension");
            }
        }
    }

    /// Appends one daily log.
    pub fn push(&mut self, username: &str, date: NaiveDate, text: &str) {
        match self.current.as_mut() {
            Some(stream) if stream.username == username => stream.advance_to(date),
            _ => {
                self.close();
                self.current = Some(Stream::new(username.to_string(), date));
            }
        }

        for line in text.lines() {
            let Some(stream) = self.current.as_mut() else {
                break;
            };
            if let Some(claimed) = claimed_date(line) {
                if claimed > stream.date {
                    tracing::debug!(
                        username,
                        from = %stream.date,
                        to = %claimed,
                        "day change occurred"
                    );
                    stream.next_day();
                    stream.date = claimed;
                }
            }
            stream.text.push_str(line);
            stream.text.push('\n');

            if ASCEND_CONFIRMATION.is_match(line) {
                let date = stream.date;
                tracing::debug!(username, %date, "ascension boundary");
                self.close();
                self.current = Some(Stream::new(username.to_string(), date));
            }
        }
    }

    pub fn finish(mut self) -> Vec<CondensedLog> {
        self.close();
        self.finished
    }
}

/// Unparsed daily logs in `dir`, ordered by username then date.
pub fn daily_logs_in(dir: &Path) -> Result<Vec<DailyLog>, StitchError> {
    if !dir.is_dir() {
        return Err(StitchError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| StitchError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut logs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| StitchError::ListDirectory {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if !path.is_file() {
            continue;
        }
        match DailyLog::from_path(&path) {
            Ok(log) => logs.push(log),
            Err(_) => tracing::trace!(path = ?path, "not a daily log, skipped"),
        }
    }

    if logs.is_empty() {
        return Err(StitchError::NoLogs(dir.to_path_buf()));
    }
    logs.sort_by(|a, b| (&a.username, a.date).cmp(&(&b.username, b.date)));
    Ok(logs)
}

/// Stitches daily logs, which must already be in chronological order.
pub fn stitch(logs: &[DailyLog]) -> Result<Vec<CondensedLog>, StitchError> {
    if logs.is_empty() {
        return Err(StitchError::EmptyInput);
    }
    let mut stitcher = Stitcher::new();
    for log in logs {
        let bytes = fs::read(&log.path).map_err(|source| StitchError::Read {
            path: log.path.clone(),
            source,
        })?;
        stitcher.push(&log.username, log.date, &String::from_utf8_lossy(&bytes));
    }
    let condensed = stitcher.finish();
    tracing::info!(
        daily_logs = logs.len(),
        ascensions = condensed.len(),
        "stitched session logs"
    );
    Ok(condensed)
}

/// Finds, orders and stitches every daily log in `dir`.
pub fn stitch_directory(dir: &Path) -> Result<Vec<CondensedLog>, StitchError> {
    stitch(&daily_logs_in(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_one_day_gap_inserts_one_marker() {
        let mut stitcher = Stitcher::new();
        stitcher.push("Tester", date(2013, 5, 21), "[1] Noob Cave\n[2] Noob Cave\n");
        stitcher.push("Tester", date(2013, 5, 22), "[3] Noob Cave\n");
        let logs = stitcher.finish();

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].text.matches("===Day 2===").count(), 1);
        assert_eq!(logs[0].text.matches("===Day").count(), 1);
        assert_eq!(
            logs[0].text,
            "[1] Noob Cave\n[2] Noob Cave\n===Day 2===\n\n[3] Noob Cave\n"
        );
    }

    #[test]
    fn test_multi_day_gap_inserts_each_day() {
        let mut stitcher = Stitcher::new();
        stitcher.push("Tester", date(2013, 5, 21), "[1] Noob Cave\n");
        stitcher.push("Tester", date(2013, 5, 24), "[2] Noob Cave\n");
        let text = &stitcher.finish()[0].text;
        assert!(text.contains("===Day 2==="));
        assert!(text.contains("===Day 4==="));
    }

    #[test]
    fn test_ascension_boundary_splits_and_resets_days() {
        let mut stitcher = Stitcher::new();
        stitcher.push(
            "Tester",
            date(2013, 5, 21),
            "[1] Noob Cave\nascend.php?pwd&action=ascend&confirm=on&confirm2=on\n[1] The Haunted Pantry\n",
        );
        stitcher.push("Tester", date(2013, 5, 22), "[2] The Haunted Pantry\n");
        let logs = stitcher.finish();

        assert_eq!(logs.len(), 2);
        assert!(logs[0].text.ends_with("confirm2=on\n"));
        assert!(logs[1].text.starts_with("[1] The Haunted Pantry"));
        assert!(logs[1].text.contains("===Day 2==="));
        assert_eq!(logs[1].file_name(), "Tester-20130521.txt");
    }

    #[test]
    fn test_ascension_at_end_of_file_drops_empty_stream() {
        let mut stitcher = Stitcher::new();
        stitcher.push("Tester", date(2013, 5, 21), "[1] Noob Cave\nascend.php?action=ascend&confirm=on\n\n");
        assert_eq!(stitcher.finish().len(), 1);
    }

    #[test]
    fn test_username_change_starts_new_stream() {
        let mut stitcher = Stitcher::new();
        stitcher.push("Alice", date(2013, 5, 21), "[1] Noob Cave\n");
        stitcher.push("Bob", date(2013, 5, 22), "[1] Noob Cave\n");
        let logs = stitcher.finish();
        assert_eq!(logs.len(), 2);
        assert!(!logs[1].text.contains("===Day"));
    }

    #[test]
    fn test_in_file_date_change_synthesizes_day() {
        let mut stitcher = Stitcher::new();
        stitcher.push(
            "Tester",
            date(2013, 5, 21),
            "05/21/13 23:58:01 [1] Noob Cave\n05/22/13 00:01:12 [2] Noob Cave\n",
        );
        stitcher.push("Tester", date(2013, 5, 22), "[3] Noob Cave\n");
        let text = &stitcher.finish()[0].text;
        assert_eq!(text.matches("===Day 2===").count(), 1);
        assert!(!text.contains("===Day 3==="));
    }

    #[test]
    fn test_directory_scan_filters_and_orders() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Tester_20130522.txt"), "[3] Noob Cave\n").unwrap();
        fs::write(dir.path().join("Tester_20130521.txt"), "[1] Noob Cave\n").unwrap();
        fs::write(dir.path().join("Tester_ascend20130521.txt"), "[1-3] Noob Cave\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let logs = daily_logs_in(dir.path()).unwrap();
        let dates: Vec<_> = logs.iter().map(|log| log.date).collect();
        assert_eq!(dates, vec![date(2013, 5, 21), date(2013, 5, 22)]);

        let condensed = stitch_directory(dir.path()).unwrap();
        let written = condensed[0].write_to(dir.path()).unwrap();
        assert!(written.ends_with("Tester-20130521.txt"));
        assert_eq!(
            fs::read_to_string(written).unwrap(),
            "[1] Noob Cave\n===Day 2===\n\n[3] Noob Cave\n"
        );
    }

    #[test]
    fn test_same_day_ascensions_are_numbered() {
        let dir = TempDir::new().unwrap();
        let mut stitcher = Stitcher::new();
        stitcher.push(
            "Tester",
            date(2013, 5, 21),
            "[1] Noob Cave\nascend.php?action=ascend&confirm=on\n[1] The Haunted Pantry\n\
ascend.php?action=ascend&confirm=on\n[1] The Spooky Forest\n",
        );
        let logs = stitcher.finish();
        assert_eq!(logs.len(), 3);

        let written = write_all(&logs, dir.path()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Tester-20130521.txt", "Tester-20130521-2.txt", "Tester-20130521-3.txt"]
        );
        assert!(fs::read_to_string(&written[0]).unwrap().starts_with("[1] Noob Cave"));
        assert!(fs::read_to_string(&written[2]).unwrap().starts_with("[1] The Spooky Forest"));
    }

    #[test]
    fn test_preconditions() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            daily_logs_in(&dir.path().join("missing")),
            Err(StitchError::MissingDirectory(_))
        ));
        assert!(matches!(daily_logs_in(dir.path()), Err(StitchError::NoLogs(_))));
        assert!(matches!(stitch(&[]), Err(StitchError::EmptyInput)));
    }

    #[test]
    fn test_preparsed_names_are_rejected() {
        assert!(DailyLog::from_path(Path::new("Tester_ascend20130521.txt")).is_err());
        assert!(DailyLog::from_path(Path::new("Tester_20131341.txt")).is_err());
        let log = DailyLog::from_path(Path::new("logs/Some_User_20130521.txt")).unwrap();
        assert_eq!(log.username, "Some_User");
    }
}
