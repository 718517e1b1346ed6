//! Configuration file structure (quire.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Destination-relative paths a clean never deletes
    pub keep_files: Vec<PathBuf>,
    /// Source-relative paths left out of the site
    pub exclude: Vec<PathBuf>,
    pub title: String,
    /// Absolute site URL, used by the sitemap
    pub url: String,
    pub sitemap: bool,
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    pub hard_links: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            destination: PathBuf::from("_site"),
            keep_files: vec![PathBuf::from(".git"), PathBuf::from(".svn")],
            exclude: vec![],
            title: String::new(),
            url: String::new(),
            sitemap: false,
            build: BuildSettings::default(),
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}
