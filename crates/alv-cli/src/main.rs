use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use alv_cli::commands::{batch, parse, stitch};
use alv_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Parse { files, json }) => {
            parse::run(files, *json, config.parse_notes)?;
        }
        Some(Commands::Stitch { dir, out }) => {
            stitch::run(dir, out.as_deref())?;
        }
        Some(Commands::Batch { dir, json, keep }) => {
            batch::run(dir, *json, *keep, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
