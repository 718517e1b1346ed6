//! Deletion of stale files from the destination tree.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::options::BuildOptions;
use crate::prune::{self, PruneError};
use crate::site::Site;
use crate::tree::{DiskTree, EntryKind, Order, Tree, TreeError, Visit};

/// What a clean did, or in a dry run, would have done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    /// Files removed
    pub removed: usize,

    /// Files protected by the keep predicate
    pub kept: usize,

    /// Empty directories pruned
    pub pruned: usize,
}

/// Errors that abort a clean. Cleanup already performed is not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("Failed to walk destination: {0}")]
    Walk(#[source] TreeError),

    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to report dry run: {0}")]
    Report(#[source] io::Error),

    #[error("Failed to prune empty directories: {0}")]
    Prune(#[from] PruneError),
}

/// Remove every file under the site destination that the keep predicate
/// does not protect, then prune empty directories.
///
/// In a dry run each deletion is reported on `log` as `rm <path>` and nothing
/// is touched.
///
/// Directories the keep predicate protects are never pruned, so an empty
/// directory under a kept path such as `.git/refs/tags` survives. Outside
/// kept paths no empty directory remains after a live clean.
pub fn clean(
    site: &Site,
    options: BuildOptions,
    log: &mut dyn Write,
) -> Result<CleanSummary, CleanError> {
    clean_tree(&DiskTree, site, options, log)
}

/// [`clean`] against an arbitrary [`Tree`].
pub fn clean_tree(
    tree: &impl Tree,
    site: &Site,
    options: BuildOptions,
    log: &mut dyn Write,
) -> Result<CleanSummary, CleanError> {
    let root = site.destination();
    let mut summary = CleanSummary::default();

    for visit in tree.walk(root, Order::Preorder) {
        let entry = match visit.map_err(CleanError::Walk)? {
            Visit::Found(entry) => entry,
            Visit::Missing(_) => continue,
        };
        if entry.kind == EntryKind::Dir {
            continue;
        }
        if site.keep_file(entry.path.strip_prefix(root).unwrap_or(&entry.path)) {
            summary.kept += 1;
            continue;
        }

        if options.dry_run {
            writeln!(log, "rm {}", entry.path.display()).map_err(CleanError::Report)?;
            summary.removed += 1;
            continue;
        }

        match tree.remove_file(&entry.path) {
            Ok(()) => {
                tracing::debug!("Removed {}", entry.path.display());
                summary.removed += 1;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CleanError::Remove {
                    path: entry.path,
                    source,
                })
            }
        }
    }

    if !options.dry_run {
        summary.pruned =
            prune::remove_empty_directories_except(tree, root, |path| site.keep_file(path))?;
    }

    Ok(summary)
}
