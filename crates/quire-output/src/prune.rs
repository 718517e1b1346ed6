//! Removal of directories left empty by a clean.

use std::io;
use std::path::{Path, PathBuf};

use crate::tree::{EntryKind, Order, Tree, TreeError, Visit};

/// Errors that abort a pruning pass.
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    #[error("Failed to walk {0}")]
    Walk(#[source] TreeError),

    #[error("Failed to read directory {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove directory {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Remove every directory beneath `root` that holds no files at any depth.
///
/// Directories are visited deepest first, so removing a leaf can leave its
/// parent empty in time for the parent's visit. `root` itself is never
/// removed. Returns the number of directories removed.
pub fn remove_empty_directories(tree: &impl Tree, root: &Path) -> Result<usize, PruneError> {
    remove_empty_directories_except(tree, root, |_| false)
}

/// Like [`remove_empty_directories`], but leaves alone any directory whose
/// root-relative path satisfies `keep`.
pub fn remove_empty_directories_except(
    tree: &impl Tree,
    root: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<usize, PruneError> {
    let mut removed = 0;

    for visit in tree.walk(root, Order::ContentsFirst) {
        let entry = match visit.map_err(PruneError::Walk)? {
            Visit::Found(entry) => entry,
            Visit::Missing(_) => continue,
        };
        if entry.kind != EntryKind::Dir || entry.path == root {
            continue;
        }
        if keep(entry.path.strip_prefix(root).unwrap_or(&entry.path)) {
            continue;
        }

        match tree.is_empty_dir(&entry.path) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(PruneError::Read {
                    path: entry.path,
                    source,
                })
            }
        }

        match tree.remove_dir(&entry.path) {
            Ok(()) => {
                tracing::debug!("Removed empty directory {}", entry.path.display());
                removed += 1;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PruneError::Remove {
                    path: entry.path,
                    source,
                })
            }
        }
    }

    Ok(removed)
}
