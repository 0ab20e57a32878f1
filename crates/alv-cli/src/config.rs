//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where `batch` writes stitched logs while parsing them.
    pub scratch_dir: PathBuf,
    /// Parser worker count; unset uses one worker per core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    /// Record `note` lines into the timeline.
    pub parse_notes: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            scratch_dir: data_dir.join("scratch"),
            worker_threads: None,
            parse_notes: false,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // ALV_SCRATCH_DIR, ALV_WORKER_THREADS, ALV_PARSE_NOTES
        figment = figment.merge(Env::prefixed("ALV_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for alv.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("alv"))
}

/// Returns the platform-specific data directory for alv.
///
/// On Linux: `~/.local/share/alv`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("alv"))
}
