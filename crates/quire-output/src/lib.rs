//! Output reconciliation for quire sites.
//!
//! Synchronizes a destination directory with a [`Site`]'s pages: stale files
//! are removed ([`clean`]), empty directories pruned ([`prune`]), then every
//! page is materialized in order ([`write`], driven by [`build`]). With
//! [`BuildOptions::dry_run`] set, each mutation is reported instead of
//! performed.

pub mod build;
pub mod clean;
pub mod options;
pub mod page;
pub mod prune;
pub mod site;
pub mod tree;
pub mod write;

pub use build::{build, BuildError, BuildResult};
pub use clean::{clean, clean_tree, CleanError, CleanSummary};
pub use options::BuildOptions;
pub use page::{Page, Render, RenderError, RenderedDocument, StaticAsset};
pub use prune::{remove_empty_directories, PruneError};
pub use site::{KeepFiles, Site};
pub use tree::{DiskTree, Entry, EntryKind, MemoryTree, Order, Tree, TreeError, Visit};
pub use write::{destination_path, write_page, WriteError};
