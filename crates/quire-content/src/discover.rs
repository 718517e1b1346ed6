//! Discovery of the pages in a source directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use quire_output::Page;
use walkdir::{DirEntry, WalkDir};

use crate::frontmatter::{extract_frontmatter, FrontmatterError};
use crate::markdown::MarkdownDocument;
use crate::sitemap::sitemap_pages;
use crate::templates::Layout;

/// Configuration for discovering a site's pages.
#[derive(Debug, Clone)]
pub struct DiscoverConfig {
    /// Source directory
    pub source: PathBuf,

    /// Output directory, skipped when it lies inside the source
    pub destination: PathBuf,

    /// Source-relative paths to leave out
    pub exclude: Vec<PathBuf>,

    /// Site title
    pub title: String,

    /// Absolute site URL, used by the sitemap
    pub url: String,

    /// Append `sitemap.xml` and `robots.txt` pages
    pub sitemap: bool,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            destination: PathBuf::from("_site"),
            exclude: vec![],
            title: String::new(),
            url: String::new(),
            sitemap: false,
        }
    }
}

/// Errors that can occur during discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid frontmatter in {}: {source}", path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("Failed to load layout {}: {source}", path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
}

/// Find every page under the source directory, in file-name order.
///
/// Entries whose name starts with `_` or `.` are skipped, along with the
/// excluded paths and the destination directory. Markdown files become
/// rendered pages; everything else is a static page.
pub fn discover(config: &DiscoverConfig) -> Result<Vec<Page>, DiscoverError> {
    if !config.source.is_dir() {
        return Err(DiscoverError::SourceNotFound(config.source.clone()));
    }

    let layout = Arc::new(load_layout(&config.source)?);
    let destination = fs::canonicalize(&config.destination).ok();
    let mut pages = Vec::new();

    let walker = WalkDir::new(&config.source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry, config, destination.as_deref()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&config.source)
            .unwrap_or(entry.path())
            .to_path_buf();

        if is_markdown(&relative) {
            if let Some(page) = markdown_page(config, &layout, entry.path(), relative)? {
                pages.push(page);
            }
        } else {
            let permalink = format!("/{}", url_path(&relative));
            pages.push(Page::static_asset(relative, permalink));
        }
    }

    if config.sitemap {
        let extra = sitemap_pages(&pages, &config.url);
        pages.extend(extra);
    }

    tracing::debug!(
        "Discovered {} pages in {}",
        pages.len(),
        config.source.display()
    );

    Ok(pages)
}

fn is_skipped(entry: &DirEntry, config: &DiscoverConfig, destination: Option<&Path>) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('_') || name.starts_with('.') {
        return true;
    }

    let relative = entry
        .path()
        .strip_prefix(&config.source)
        .unwrap_or(entry.path());
    if config.exclude.iter().any(|excluded| relative.starts_with(excluded)) {
        return true;
    }

    entry.file_type().is_dir()
        && destination.is_some_and(|dst| fs::canonicalize(entry.path()).is_ok_and(|p| p == dst))
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown")
    )
}

fn markdown_page(
    config: &DiscoverConfig,
    layout: &Arc<Layout>,
    path: &Path,
    relative: PathBuf,
) -> Result<Option<Page>, DiscoverError> {
    let content = fs::read_to_string(path).map_err(|source| DiscoverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (frontmatter, _) =
        extract_frontmatter(&content).map_err(|source| DiscoverError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;
    let frontmatter = frontmatter.unwrap_or_default();

    if !frontmatter.published {
        tracing::debug!("Skipping unpublished {}", path.display());
        return Ok(None);
    }

    let permalink = frontmatter
        .permalink
        .unwrap_or_else(|| default_permalink(&relative));
    let document = MarkdownDocument {
        path: path.to_path_buf(),
        url: permalink.clone(),
        site_title: config.title.clone(),
        layout: Arc::clone(layout),
    };

    Ok(Some(Page::rendered(relative, permalink, document)))
}

/// `docs/intro.md` maps to `/docs/intro`, `docs/index.md` to `/docs/`.
fn default_permalink(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = relative.parent().map(url_path).unwrap_or_default();

    let mut permalink = String::from("/");
    if !parent.is_empty() {
        permalink.push_str(&parent);
        permalink.push('/');
    }
    if stem != "index" {
        permalink.push_str(&stem);
    }
    permalink
}

/// Join the normal components of `path` with `/`.
fn url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn load_layout(source: &Path) -> Result<Layout, DiscoverError> {
    let path = source.join("_layouts").join("default.html");
    if !path.is_file() {
        return Ok(Layout::new());
    }

    let template = fs::read_to_string(&path).map_err(|source| DiscoverError::Read {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Using layout {}", path.display());

    Layout::from_source(template).map_err(|source| DiscoverError::Layout { path, source })
}
