//! Ascension log visualizer CLI library.
//!
//! This crate provides the command-line surface over `alv-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
