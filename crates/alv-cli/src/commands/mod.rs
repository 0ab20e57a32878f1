//! CLI subcommand implementations.

pub mod batch;
pub mod parse;
pub mod report;
pub mod stitch;
