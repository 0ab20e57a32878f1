//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ascension log visualizer.
///
/// Stitches daily session logs into one log per ascension and summarizes
/// each ascension's turns, levels, quests and resources.
#[derive(Debug, Parser)]
#[command(name = "alv", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse stitched or pre-parsed ascension logs and print their summaries.
    Parse {
        /// Log files to parse.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Stitch daily session logs into one file per ascension.
    Stitch {
        /// Directory holding `USERNAME_YYYYMMDD.txt` daily logs.
        dir: PathBuf,

        /// Where to write the stitched logs (defaults to the log directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Stitch and parse every ascension in a log directory.
    Batch {
        /// Directory holding daily session logs.
        dir: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Keep the stitched logs in the scratch directory.
        #[arg(long)]
        keep: bool,
    },
}
