//! Turns a quire source directory into the pages of a site.
//!
//! Markdown files become rendered pages wrapped in a layout, everything else
//! is copied verbatim. Optionally a sitemap and robots.txt are added.

pub mod discover;
pub mod frontmatter;
pub mod markdown;
pub mod sitemap;
pub mod templates;

pub use discover::{discover, DiscoverConfig, DiscoverError};
pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use markdown::{markdown_to_html, MarkdownDocument};
pub use sitemap::{sitemap_pages, Robots, Sitemap};
pub use templates::{Layout, PageContext};
