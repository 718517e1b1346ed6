//! Layout template wrapped around rendered pages.

use minijinja::{context, Environment};

/// Values available to a layout.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageContext<'a> {
    /// Page title
    pub title: &'a str,
    /// Site title
    pub site_title: &'a str,
    /// Rendered content HTML
    pub content: &'a str,
    /// Page URL relative to the site root
    pub url: &'a str,
}

/// A page layout using minijinja.
pub struct Layout {
    env: Environment<'static>,
}

impl Layout {
    /// Create a layout from the built-in template.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("layout.html".to_string(), DEFAULT_LAYOUT.to_string())
            .expect("Failed to add default layout");

        Self { env }
    }

    /// Create a layout from template source, such as `_layouts/default.html`.
    pub fn from_source(source: String) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template_owned("layout.html".to_string(), source)?;
        Ok(Self { env })
    }

    /// Render a page through the layout.
    pub fn render(&self, page: &PageContext<'_>) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("layout.html")?;

        tmpl.render(context! {
            title => page.title,
            site_title => page.site_title,
            content => page.content,
            url => page.url,
        })
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_LAYOUT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% if title %}{{ title }} - {% endif %}{{ site_title }}</title>
</head>
<body>
  <header><a href="/">{{ site_title }}</a></header>
  <main>
    {{ content | safe }}
  </main>
</body>
</html>
"##;
