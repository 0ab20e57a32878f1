//! Core ingestion pipeline for ascension session logs.
//!
//! This crate contains the fundamental types and logic for:
//! - Reading: splitting raw log text into typed blocks and parsing each line
//! - Timeline: the ordered, merge-safe record of one ascension
//! - Stitching: joining daily logs into one log per ascension
//! - Summaries: levels, quests, consumption and resource totals
//! - Batch: parsing many ascensions on a worker pool

pub mod batch;
pub mod block;
pub mod equipment;
pub mod game_data;
pub mod line;
pub mod parser;
pub mod patterns;
pub mod preparsed;
pub mod quest;
pub mod stitch;
pub mod summary;
pub mod tally;
pub mod timeline;
pub mod turn;
pub mod types;

pub use batch::{BatchError, BatchOptions, BatchReport, LogFailure, ParsedLog};
pub use block::{BlockKind, BlockReader, LogBlock};
pub use game_data::GameData;
pub use parser::{IngestError, LogParser};
pub use preparsed::read_preparsed_file;
pub use stitch::{CondensedLog, DailyLog, StitchError, Stitcher, write_all};
pub use summary::{LevelData, Summary, SummaryError};
pub use timeline::Timeline;
pub use types::{CharacterClass, Stat, Username, ValidationError};
