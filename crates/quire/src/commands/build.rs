//! Site build command.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use quire_content::{discover, DiscoverConfig};
use quire_output::{build, BuildOptions};

use crate::config::ConfigFile;

/// Flags of the build command. Unset values fall back to the config file.
#[derive(Debug, Default)]
pub struct BuildArgs {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub dry_run: bool,
    pub hard_links: bool,
}

/// Run the build command.
pub fn run(config: ConfigFile, args: BuildArgs) -> Result<()> {
    let source = args.source.unwrap_or(config.source);
    let destination = args.destination.unwrap_or(config.destination);
    let options = BuildOptions {
        dry_run: args.dry_run,
        use_hard_links: args.hard_links || config.build.hard_links,
    };

    tracing::info!(
        "Building {} into {}{}",
        source.display(),
        destination.display(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    let pages = discover(&DiscoverConfig {
        source: source.clone(),
        destination: destination.clone(),
        exclude: config.exclude,
        title: config.title,
        url: config.url,
        sitemap: config.sitemap,
    })?;

    let site = super::site(source, destination, config.keep_files).with_pages(pages);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match build(&site, options, &mut out) {
        Ok(result) => result,
        Err(err) => {
            let attempted = err.attempted();
            return Err(anyhow::Error::new(err)
                .context(format!("Build stopped after {attempted} attempted pages")));
        }
    };
    out.flush()?;

    tracing::info!(
        "Removed {} stale files and {} empty directories",
        result.clean.removed,
        result.clean.pruned
    );
    tracing::info!("Built {} pages in {}ms", result.pages, result.duration_ms);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builds_source_into_destination() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("out");
        fs::create_dir_all(src.join("img")).unwrap();
        fs::write(src.join("index.md"), "# Hello").unwrap();
        fs::write(src.join("img/a.png"), "png").unwrap();
        fs::create_dir_all(dest.join(".git")).unwrap();
        fs::write(dest.join(".git/HEAD"), "ref").unwrap();
        fs::write(dest.join("stale.html"), "old").unwrap();

        let config = ConfigFile {
            sitemap: true,
            url: "https://example.com".to_string(),
            ..ConfigFile::default()
        };
        let args = BuildArgs {
            source: Some(src),
            destination: Some(dest.clone()),
            ..BuildArgs::default()
        };
        run(config, args).unwrap();

        assert!(fs::read_to_string(dest.join("index.html"))
            .unwrap()
            .contains("<h1>Hello</h1>"));
        assert_eq!(fs::read(dest.join("img/a.png")).unwrap(), b"png");
        assert!(fs::read_to_string(dest.join("sitemap.xml"))
            .unwrap()
            .contains("<loc>https://example.com/</loc>"));
        assert!(dest.join("robots.txt").exists());
        assert!(dest.join(".git/HEAD").exists());
        assert!(!dest.join("stale.html").exists());
    }

    #[test]
    fn dry_run_leaves_destination_alone() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("about.md"), "About").unwrap();

        let args = BuildArgs {
            source: Some(src),
            destination: Some(dest.clone()),
            dry_run: true,
            ..BuildArgs::default()
        };
        run(ConfigFile::default(), args).unwrap();

        assert!(!dest.exists());
    }

    #[test]
    fn reports_attempted_pages_on_failure() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("b.txt"), "b").unwrap();
        // A kept directory where b.txt must go makes its copy fail.
        fs::create_dir_all(dest.join("b.txt")).unwrap();
        fs::write(dest.join("b.txt/keep"), "k").unwrap();

        let config = ConfigFile {
            keep_files: vec![PathBuf::from("b.txt")],
            ..ConfigFile::default()
        };
        let args = BuildArgs {
            source: Some(src),
            destination: Some(dest.clone()),
            ..BuildArgs::default()
        };
        let err = run(config, args).unwrap_err();

        assert!(err.to_string().contains("after 2 attempted pages"));
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"a");
    }
}
