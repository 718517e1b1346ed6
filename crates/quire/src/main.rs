//! quire CLI - builds a static site into its output directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Builds a static site into its output directory")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to quire.toml config file
    #[arg(short, long, global = true, default_value = "quire.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the destination and write every page into it
    Build {
        /// Source directory (defaults to config or ".")
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination directory (defaults to config or "_site")
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Print what would change without touching the destination
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Hard-link static files instead of copying them
        #[arg(long)]
        hard_links: bool,
    },

    /// Remove files the site no longer produces from the destination
    Clean {
        /// Destination directory (defaults to config or "_site")
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Print what would be removed without removing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Stdout is reserved for dry-run output.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build {
            source,
            destination,
            dry_run,
            hard_links,
        } => {
            let args = commands::build::BuildArgs {
                source,
                destination,
                dry_run,
                hard_links,
            };
            commands::build::run(config, args)?;
        }
        Commands::Clean {
            destination,
            dry_run,
        } => {
            commands::clean::run(config, destination, dry_run)?;
        }
    }

    Ok(())
}
