//! Destination clean command.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use quire_output::{clean, BuildOptions};

use crate::config::ConfigFile;

/// Run the clean command.
pub fn run(config: ConfigFile, destination: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let destination = destination.unwrap_or(config.destination);
    let options = BuildOptions {
        dry_run,
        ..BuildOptions::default()
    };

    tracing::info!("Cleaning {}", destination.display());

    let site = super::site(config.source, destination, config.keep_files);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = clean(&site, options, &mut out)?;
    out.flush()?;

    tracing::info!(
        "Removed {} files and {} empty directories, kept {}",
        summary.removed,
        summary.pruned,
        summary.kept
    );

    Ok(())
}
