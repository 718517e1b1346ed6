//! The site model the pipeline reconciles against.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::page::Page;

/// Source and destination roots, the ordered pages, and the predicate that
/// protects destination files from deletion.
pub struct Site {
    source: PathBuf,
    destination: PathBuf,
    pages: Vec<Page>,
    keep: Box<dyn Fn(&Path) -> bool>,
}

impl Site {
    /// Create a site with no pages that keeps the [`KeepFiles::default`]
    /// paths.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let keep = KeepFiles::default();
        Self {
            source: source.into(),
            destination: destination.into(),
            pages: Vec::new(),
            keep: Box::new(move |path: &Path| keep.matches(path)),
        }
    }

    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    /// Replace the keep predicate. It receives paths relative to the
    /// destination root.
    pub fn with_keep_files(mut self, keep: impl Fn(&Path) -> bool + 'static) -> Self {
        self.keep = Box::new(keep);
        self
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Whether the destination-relative `path` must survive a clean.
    pub fn keep_file(&self, path: &Path) -> bool {
        (self.keep)(path)
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

/// Destination-relative path prefixes that are never deleted.
///
/// Matching is by path component, so `.git` protects `.git/config` but not
/// `.github/workflows/ci.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepFiles {
    prefixes: Vec<PathBuf>,
}

impl KeepFiles {
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

impl Default for KeepFiles {
    fn default() -> Self {
        Self::new([".git", ".svn"])
    }
}
