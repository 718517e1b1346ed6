pub mod build;
pub mod clean;

use std::path::PathBuf;

use quire_output::{KeepFiles, Site};

/// A site over `source` and `destination` protecting `keep_files`.
fn site(source: PathBuf, destination: PathBuf, keep_files: Vec<PathBuf>) -> Site {
    let keep = KeepFiles::new(keep_files);
    Site::new(source, destination).with_keep_files(move |path| keep.matches(path))
}
