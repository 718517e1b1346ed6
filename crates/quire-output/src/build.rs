//! Top-level orchestration: clean the destination, then write every page.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::clean::{self, CleanError, CleanSummary};
use crate::options::BuildOptions;
use crate::site::Site;
use crate::write::{destination_path, write_page, WriteError};

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages written
    pub pages: usize,

    /// What the clean pass did
    pub clean: CleanSummary,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to clean destination: {0}")]
    Clean(#[from] CleanError),

    #[error("Pages {first} and {second} both write {}", path.display())]
    DuplicateDestination {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to write {permalink} (page {attempted}): {source}")]
    Page {
        attempted: usize,
        permalink: String,
        #[source]
        source: WriteError,
    },
}

impl BuildError {
    /// Pages attempted before the build stopped, counting the page that
    /// failed. Zero when the build stopped before writing any page.
    pub fn attempted(&self) -> usize {
        match self {
            BuildError::Clean(_) | BuildError::DuplicateDestination { .. } => 0,
            BuildError::Page { attempted, .. } => *attempted,
        }
    }
}

/// Clean the destination and write every page of `site` into it, in order.
///
/// Stops at the first failure. Pages after the failing one are never
/// touched. Two pages that resolve to the same destination file are refused
/// before the destination is cleaned.
pub fn build(
    site: &Site,
    options: BuildOptions,
    log: &mut dyn Write,
) -> Result<BuildResult, BuildError> {
    let start = Instant::now();

    check_destinations(site)?;
    let clean = clean::clean(site, options, log)?;

    let mut attempted = 0;
    for page in site.pages() {
        attempted += 1;
        write_page(site, page, options, log).map_err(|source| BuildError::Page {
            attempted,
            permalink: page.permalink().to_owned(),
            source,
        })?;
    }

    let duration = start.elapsed();

    Ok(BuildResult {
        pages: attempted,
        clean,
        duration_ms: duration.as_millis() as u64,
    })
}

// Invalid permalinks are skipped here; `write_page` reports them in order.
fn check_destinations(site: &Site) -> Result<(), BuildError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for page in site.pages() {
        let Ok(path) = destination_path(site, page) else {
            continue;
        };
        if let Some(first) = seen.insert(path.clone(), page.permalink()) {
            return Err(BuildError::DuplicateDestination {
                path,
                first: first.to_owned(),
                second: page.permalink().to_owned(),
            });
        }
    }
    Ok(())
}
