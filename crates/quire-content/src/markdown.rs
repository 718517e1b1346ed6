//! Markdown pages rendered through a layout.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use quire_output::{Render, RenderError};

use crate::frontmatter::extract_frontmatter;
use crate::templates::{Layout, PageContext};

/// A Markdown source file rendered to HTML when its page is written.
///
/// The source is read at render time, so failures reading or parsing it
/// surface as render errors for that page.
pub struct MarkdownDocument {
    /// Absolute or process-relative path of the source file
    pub path: PathBuf,

    /// URL of the page relative to the site root
    pub url: String,

    /// Site title passed to the layout
    pub site_title: String,

    pub layout: Arc<Layout>,
}

impl Render for MarkdownDocument {
    fn render(&self, out: &mut dyn Write) -> Result<(), RenderError> {
        let source = fs::read_to_string(&self.path)?;
        let (frontmatter, body) = extract_frontmatter(&source)?;

        let title = frontmatter.and_then(|fm| fm.title).unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let content = markdown_to_html(body);

        let html = self.layout.render(&PageContext {
            title: &title,
            site_title: &self.site_title,
            content: &content,
            url: &self.url,
        })?;

        out.write_all(html.as_bytes())?;
        Ok(())
    }
}

/// Render Markdown to HTML.
pub fn markdown_to_html(content: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}
