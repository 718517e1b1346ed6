//! Materializing a single page at its destination.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::options::BuildOptions;
use crate::page::{Page, Render, RenderError};
use crate::site::Site;

/// Errors writing a page. Each is fatal to that page only; nothing is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Permalink escapes the destination: {0}")]
    InvalidPermalink(String),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists, clean before linking: {}", path.display())]
    LinkExists { path: PathBuf },

    #[error("Failed to link {} to {}: {source}", src.display(), dst.display())]
    Link {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to replace existing {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to render {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to report dry run: {0}")]
    Report(#[source] io::Error),
}

/// Compute where `page` is written.
///
/// The permalink is joined beneath the destination root. Rendered pages with
/// an extensionless permalink resolve to `index.html` inside that directory:
/// `/about` becomes `<destination>/about/index.html`.
pub fn destination_path(site: &Site, page: &Page) -> Result<PathBuf, WriteError> {
    let permalink = page.permalink();
    let relative = Path::new(permalink.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(WriteError::InvalidPermalink(permalink.to_owned()));
    }

    let mut dst = site.destination().join(relative);
    if page.is_directory_index() {
        dst.push("index.html");
    }
    Ok(dst)
}

/// Write one page to its destination and return the path written.
///
/// In a dry run the intended write is reported on `log` as
/// `create <dst> from <src>` and the filesystem is not touched, not even to
/// create parent directories. Generated pages report `from (generated)`.
///
/// Copies and renders replace any file already at the destination rather
/// than writing into it, so a hard link made earlier never carries a write
/// back into the source tree.
pub fn write_page(
    site: &Site,
    page: &Page,
    options: BuildOptions,
    log: &mut dyn Write,
) -> Result<PathBuf, WriteError> {
    let dst = destination_path(site, page)?;
    let src = site.source().join(page.source_path());

    if options.dry_run {
        if page.is_generated() {
            writeln!(log, "create {} from (generated)", dst.display())
        } else {
            writeln!(log, "create {} from {}", dst.display(), src.display())
        }
        .map_err(WriteError::Report)?;
        return Ok(dst);
    }

    if let Some(parent) = dst.parent() {
        create_dirs(parent).map_err(|source| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match page {
        Page::Static(_) if options.use_hard_links => link(&src, &dst)?,
        Page::Static(_) => {
            unlink_existing(&dst)?;
            copy_file(&src, &dst).map_err(|source| WriteError::Copy {
                src: src.clone(),
                dst: dst.clone(),
                source,
            })?;
        }
        Page::Rendered(doc) => {
            unlink_existing(&dst)?;
            render_to(&dst, doc.renderer.as_ref())?;
        }
    }

    tracing::debug!("Wrote {}", dst.display());
    Ok(dst)
}

fn create_dirs(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

fn link(src: &Path, dst: &Path) -> Result<(), WriteError> {
    fs::hard_link(src, dst).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            WriteError::LinkExists {
                path: dst.to_path_buf(),
            }
        } else {
            WriteError::Link {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
                source,
            }
        }
    })
}

// A file already at `dst` may be a hard link into the source tree. Writing
// through it would change the source, so it is unlinked and `dst` is then
// created fresh.
fn unlink_existing(dst: &Path) -> Result<(), WriteError> {
    match fs::remove_file(dst) {
        Ok(()) => {
            tracing::debug!("Replaced existing {}", dst.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WriteError::Replace {
            path: dst.to_path_buf(),
            source,
        }),
    }
}

fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut output = options.open(dst)?;
    let copied = io::copy(&mut input, &mut output)?;
    output.flush()?;
    Ok(copied)
}

// The writer is dropped on every path out of here, closing the file. A
// failed render leaves whatever it wrote in place.
fn render_to(dst: &Path, renderer: &dyn Render) -> Result<(), WriteError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|source| WriteError::Create {
            path: dst.to_path_buf(),
            source,
        })?;
    let mut out = BufWriter::new(file);

    renderer
        .render(&mut out)
        .map_err(|source| WriteError::Render {
            path: dst.to_path_buf(),
            source,
        })?;

    out.flush().map_err(|source| WriteError::Write {
        path: dst.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    struct Text(&'static str);

    impl Render for Text {
        fn render(&self, out: &mut dyn Write) -> Result<(), RenderError> {
            out.write_all(self.0.as_bytes())?;
            Ok(())
        }
    }

    struct Truncated;

    impl Render for Truncated {
        fn render(&self, out: &mut dyn Write) -> Result<(), RenderError> {
            out.write_all(b"<html><body>")?;
            Err("unknown filter `shout`".into())
        }
    }

    fn fixture() -> (TempDir, Site) {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("img")).unwrap();
        fs::write(src.join("favicon.ico"), b"\x00\x00\x01\x00icon").unwrap();
        fs::write(src.join("img/logo.png"), b"png bytes").unwrap();
        let site = Site::new(src, temp.path().join("_site"));
        (temp, site)
    }

    #[test]
    fn extensionless_rendered_pages_become_directory_indexes() {
        let site = Site::new("/src", "/out");

        let about = Page::rendered("about.md", "/about", Text(""));
        let docs = Page::rendered("docs/index.md", "/docs/", Text(""));
        let home = Page::rendered("index.md", "/", Text(""));
        let feed = Page::rendered("feed.xml", "/feed.xml", Text(""));
        let favicon = Page::static_asset("favicon.ico", "/favicon.ico");
        let license = Page::static_asset("LICENSE", "/LICENSE");

        assert_eq!(
            destination_path(&site, &about).unwrap(),
            PathBuf::from("/out/about/index.html")
        );
        assert_eq!(
            destination_path(&site, &docs).unwrap(),
            PathBuf::from("/out/docs/index.html")
        );
        assert_eq!(
            destination_path(&site, &home).unwrap(),
            PathBuf::from("/out/index.html")
        );
        assert_eq!(
            destination_path(&site, &feed).unwrap(),
            PathBuf::from("/out/feed.xml")
        );
        assert_eq!(
            destination_path(&site, &favicon).unwrap(),
            PathBuf::from("/out/favicon.ico")
        );
        assert_eq!(
            destination_path(&site, &license).unwrap(),
            PathBuf::from("/out/LICENSE")
        );
    }

    #[test]
    fn rejects_permalinks_outside_destination() {
        let site = Site::new("/src", "/out");
        let page = Page::rendered("evil.md", "/../../etc/passwd", Text(""));

        let err = destination_path(&site, &page).unwrap_err();

        assert!(matches!(err, WriteError::InvalidPermalink(p) if p == "/../../etc/passwd"));
    }

    #[test]
    fn copies_static_pages() {
        let (_temp, site) = fixture();
        let page = Page::static_asset("img/logo.png", "/img/logo.png");

        let dst = write_page(&site, &page, BuildOptions::default(), &mut io::sink()).unwrap();

        assert_eq!(dst, site.destination().join("img/logo.png"));
        assert_eq!(fs::read(&dst).unwrap(), b"png bytes");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dst).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
            let dir = fs::metadata(site.destination().join("img")).unwrap();
            assert_eq!(dir.permissions().mode() & 0o777, 0o755);
        }
    }

    #[test]
    fn copy_reports_missing_source() {
        let (_temp, site) = fixture();
        let page = Page::static_asset("missing.css", "/missing.css");

        let err = write_page(&site, &page, BuildOptions::default(), &mut io::sink()).unwrap_err();

        assert!(matches!(err, WriteError::Copy { .. }));
    }

    #[test]
    fn hard_links_static_pages() {
        let (_temp, site) = fixture();
        let page = Page::static_asset("favicon.ico", "/favicon.ico");
        let options = BuildOptions {
            use_hard_links: true,
            ..BuildOptions::default()
        };

        let dst = write_page(&site, &page, options, &mut io::sink()).unwrap();
        let src = site.source().join("favicon.ico");

        assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let (a, b) = (fs::metadata(&src).unwrap(), fs::metadata(&dst).unwrap());
            assert_eq!((a.dev(), a.ino()), (b.dev(), b.ino()));
        }
    }

    #[test]
    fn hard_link_refuses_existing_destination() {
        let (_temp, site) = fixture();
        let page = Page::static_asset("favicon.ico", "/favicon.ico");
        let options = BuildOptions {
            use_hard_links: true,
            ..BuildOptions::default()
        };
        fs::create_dir_all(site.destination()).unwrap();
        fs::write(site.destination().join("favicon.ico"), "stale").unwrap();

        let err = write_page(&site, &page, options, &mut io::sink()).unwrap_err();

        assert!(matches!(err, WriteError::LinkExists { .. }));
    }

    #[test]
    fn rendering_over_a_hard_link_leaves_the_source_alone() {
        let (_temp, site) = fixture();
        let linked = Page::static_asset("favicon.ico", "/favicon.ico");
        let rendered = Page::rendered("favicon.md", "/favicon.ico", Text("replaced"));
        let hard_links = BuildOptions {
            use_hard_links: true,
            ..BuildOptions::default()
        };

        write_page(&site, &linked, hard_links, &mut io::sink()).unwrap();
        let dst = write_page(&site, &rendered, hard_links, &mut io::sink()).unwrap();

        assert_eq!(fs::read_to_string(dst).unwrap(), "replaced");
        assert_eq!(
            fs::read(site.source().join("favicon.ico")).unwrap(),
            b"\x00\x00\x01\x00icon"
        );
    }

    #[test]
    fn copying_over_a_hard_link_leaves_the_source_alone() {
        let (_temp, site) = fixture();
        let linked = Page::static_asset("favicon.ico", "/favicon.ico");
        let copied = Page::static_asset("img/logo.png", "/favicon.ico");
        let hard_links = BuildOptions {
            use_hard_links: true,
            ..BuildOptions::default()
        };

        write_page(&site, &linked, hard_links, &mut io::sink()).unwrap();
        let dst = write_page(&site, &copied, BuildOptions::default(), &mut io::sink()).unwrap();

        assert_eq!(fs::read(dst).unwrap(), b"png bytes");
        assert_eq!(
            fs::read(site.source().join("favicon.ico")).unwrap(),
            b"\x00\x00\x01\x00icon"
        );
    }

    #[test]
    fn renders_into_created_file() {
        let (_temp, site) = fixture();
        let page = Page::rendered("about.md", "/about", Text("<h1>About</h1>"));

        let dst = write_page(&site, &page, BuildOptions::default(), &mut io::sink()).unwrap();

        assert_eq!(dst, site.destination().join("about/index.html"));
        assert_eq!(fs::read_to_string(dst).unwrap(), "<h1>About</h1>");
    }

    #[test]
    fn failed_render_leaves_partial_file() {
        let (_temp, site) = fixture();
        let page = Page::rendered("broken.md", "/broken", Truncated);

        let err = write_page(&site, &page, BuildOptions::default(), &mut io::sink()).unwrap_err();

        assert!(matches!(err, WriteError::Render { .. }));
        assert!(err.to_string().contains("unknown filter"));
        let partial = fs::read_to_string(site.destination().join("broken/index.html")).unwrap();
        assert_eq!(partial, "<html><body>");
    }

    #[test]
    fn dry_run_reports_and_creates_nothing() {
        let (_temp, site) = fixture();
        let page = Page::rendered("blog/post.md", "/blog/post", Text("post"));
        let mut log: Vec<u8> = Vec::new();

        let dst = write_page(&site, &page, BuildOptions::dry_run(), &mut log).unwrap();

        assert!(!site.destination().exists());
        assert_eq!(
            String::from_utf8(log).unwrap(),
            format!(
                "create {} from {}\n",
                dst.display(),
                site.source().join("blog/post.md").display()
            )
        );
    }

    #[test]
    fn dry_run_names_generated_pages() {
        let (_temp, site) = fixture();
        let page = Page::generated("/sitemap.xml", Text("<urlset/>"));
        let mut log: Vec<u8> = Vec::new();

        let dst = write_page(&site, &page, BuildOptions::dry_run(), &mut log).unwrap();

        assert_eq!(
            String::from_utf8(log).unwrap(),
            format!("create {} from (generated)\n", dst.display())
        );
    }
}
