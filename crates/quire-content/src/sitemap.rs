//! Sitemap and robots.txt pages, generated from the other pages of a site.

use std::io::Write;

use quire_output::{Page, Render, RenderError};

/// `sitemap.xml` listing the HTML pages of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    /// Absolute page URLs, in page order
    pub urls: Vec<String>,
}

impl Sitemap {
    /// Collect the URLs of every HTML page, absolute against `base_url`.
    /// `/404.html` is left out.
    pub fn for_pages(pages: &[Page], base_url: &str) -> Self {
        let urls = pages
            .iter()
            .filter_map(page_url)
            .filter(|url| url != "/404.html")
            .map(|url| absolute_url(base_url, &url))
            .collect();
        Self { urls }
    }
}

impl Render for Sitemap {
    fn render(&self, out: &mut dyn Write) -> Result<(), RenderError> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
        )?;
        for url in &self.urls {
            writeln!(out, "  <url>\n    <loc>{}</loc>\n  </url>", xml_escape(url))?;
        }
        writeln!(out, "</urlset>")?;
        Ok(())
    }
}

/// `robots.txt` pointing crawlers at the sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robots {
    pub sitemap_url: String,
}

impl Render for Robots {
    fn render(&self, out: &mut dyn Write) -> Result<(), RenderError> {
        writeln!(out, "Sitemap: {}", self.sitemap_url)?;
        Ok(())
    }
}

/// The `/sitemap.xml` and `/robots.txt` pages for `pages`. A file the site
/// already provides at either permalink is left to stand and not generated.
pub fn sitemap_pages(pages: &[Page], base_url: &str) -> Vec<Page> {
    let provided = |permalink: &str| pages.iter().any(|page| page.permalink() == permalink);
    let mut generated = Vec::new();

    if provided("/sitemap.xml") {
        tracing::debug!("Site provides /sitemap.xml, not generating one");
    } else {
        generated.push(Page::generated(
            "/sitemap.xml",
            Sitemap::for_pages(pages, base_url),
        ));
    }

    if provided("/robots.txt") {
        tracing::debug!("Site provides /robots.txt, not generating one");
    } else {
        let robots = Robots {
            sitemap_url: absolute_url(base_url, "/sitemap.xml"),
        };
        generated.push(Page::generated("/robots.txt", robots));
    }

    generated
}

/// Site-relative URL of an HTML page, `None` for anything else. Directory
/// indexes are addressed by their directory.
fn page_url(page: &Page) -> Option<String> {
    let permalink = page.permalink();
    let permalink = if permalink.starts_with('/') {
        permalink.to_owned()
    } else {
        format!("/{permalink}")
    };

    if page.is_directory_index() {
        if permalink.ends_with('/') {
            return Some(permalink);
        }
        return Some(permalink + "/");
    }
    if let Some(dir) = permalink.strip_suffix("index.html") {
        if dir.ends_with('/') {
            return Some(dir.to_owned());
        }
    }
    if permalink.ends_with(".html") || permalink.ends_with(".htm") {
        return Some(permalink);
    }
    None
}

fn absolute_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Blank;

    impl Render for Blank {
        fn render(&self, _out: &mut dyn Write) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn pages() -> Vec<Page> {
        vec![
            Page::rendered("index.md", "/", Blank),
            Page::rendered("about.md", "/about", Blank),
            Page::static_asset("legacy/index.html", "/legacy/index.html"),
            Page::static_asset("404.html", "/404.html"),
            Page::static_asset("css/site.css", "/css/site.css"),
            Page::rendered("feed.md", "/feed.xml", Blank),
        ]
    }

    #[test]
    fn lists_html_pages_only() {
        let sitemap = Sitemap::for_pages(&pages(), "https://example.com/");

        assert_eq!(
            sitemap.urls,
            vec![
                "https://example.com/".to_string(),
                "https://example.com/about/".to_string(),
                "https://example.com/legacy/".to_string(),
            ]
        );
    }

    #[test]
    fn renders_escaped_xml() {
        let sitemap = Sitemap {
            urls: vec!["https://example.com/?a=1&b=2".to_string()],
        };

        let mut out: Vec<u8> = Vec::new();
        sitemap.render(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
             \x20 <url>\n\
             \x20   <loc>https://example.com/?a=1&amp;b=2</loc>\n\
             \x20 </url>\n\
             </urlset>\n"
        );
    }

    #[test]
    fn adds_sitemap_and_robots_pages() {
        let extra = sitemap_pages(&pages(), "https://example.com");

        let permalinks: Vec<&str> = extra.iter().map(Page::permalink).collect();
        assert_eq!(permalinks, vec!["/sitemap.xml", "/robots.txt"]);
        assert!(extra.iter().all(|page| !page.is_directory_index()));
        assert!(extra.iter().all(Page::is_generated));

        let Page::Rendered(robots) = &extra[1] else {
            panic!("robots.txt should be rendered");
        };
        let mut out: Vec<u8> = Vec::new();
        robots.renderer.render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Sitemap: https://example.com/sitemap.xml\n"
        );
    }

    #[test]
    fn leaves_provided_files_alone() {
        let mut pages = pages();
        pages.push(Page::static_asset("robots.txt", "/robots.txt"));

        let extra = sitemap_pages(&pages, "https://example.com");

        let permalinks: Vec<&str> = extra.iter().map(Page::permalink).collect();
        assert_eq!(permalinks, vec!["/sitemap.xml"]);

        pages.push(Page::rendered("sitemap.md", "/sitemap.xml", Blank));
        assert!(sitemap_pages(&pages, "https://example.com").is_empty());
    }
}
