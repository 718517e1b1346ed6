//! Pages the pipeline materializes.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error reported by a [`Render`] implementation.
pub type RenderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Produces the bytes of a rendered page.
pub trait Render {
    /// Write the page's content into `out`.
    fn render(&self, out: &mut dyn Write) -> Result<(), RenderError>;
}

/// A file copied or linked verbatim from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// Path relative to the site source root
    pub source_path: PathBuf,

    /// Destination-relative output path
    pub permalink: String,
}

/// A page whose content comes from a render capability.
pub struct RenderedDocument {
    /// Path relative to the site source root
    pub source_path: PathBuf,

    /// Destination-relative output path, possibly extensionless
    pub permalink: String,

    /// Produces the page content
    pub renderer: Box<dyn Render>,
}

impl fmt::Debug for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedDocument")
            .field("source_path", &self.source_path)
            .field("permalink", &self.permalink)
            .finish_non_exhaustive()
    }
}

/// A single output file of a site.
#[derive(Debug)]
pub enum Page {
    Static(StaticAsset),
    Rendered(RenderedDocument),
}

impl Page {
    /// Create a static page.
    pub fn static_asset(source_path: impl Into<PathBuf>, permalink: impl Into<String>) -> Self {
        Page::Static(StaticAsset {
            source_path: source_path.into(),
            permalink: permalink.into(),
        })
    }

    /// Create a rendered page.
    pub fn rendered(
        source_path: impl Into<PathBuf>,
        permalink: impl Into<String>,
        renderer: impl Render + 'static,
    ) -> Self {
        Page::Rendered(RenderedDocument {
            source_path: source_path.into(),
            permalink: permalink.into(),
            renderer: Box::new(renderer),
        })
    }

    /// Create a rendered page with no source file, such as a sitemap built
    /// from the other pages.
    pub fn generated(permalink: impl Into<String>, renderer: impl Render + 'static) -> Self {
        Page::rendered(PathBuf::new(), permalink, renderer)
    }

    pub fn source_path(&self) -> &Path {
        match self {
            Page::Static(asset) => &asset.source_path,
            Page::Rendered(doc) => &doc.source_path,
        }
    }

    pub fn permalink(&self) -> &str {
        match self {
            Page::Static(asset) => &asset.permalink,
            Page::Rendered(doc) => &doc.permalink,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Page::Static(_))
    }

    /// Whether the page was produced without a source file.
    pub fn is_generated(&self) -> bool {
        !self.is_static() && self.source_path().as_os_str().is_empty()
    }

    /// Whether the page is written as `index.html` inside a directory named
    /// by its permalink. True for rendered pages with extensionless
    /// permalinks.
    pub fn is_directory_index(&self) -> bool {
        !self.is_static() && !permalink_has_extension(self.permalink())
    }
}

/// Whether the last segment of `permalink` carries an extension. A trailing
/// `/` leaves an empty last segment, which has none.
pub fn permalink_has_extension(permalink: &str) -> bool {
    permalink
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
}
