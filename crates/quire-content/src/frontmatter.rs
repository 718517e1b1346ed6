//! Frontmatter extraction and parsing.

use serde::Deserialize;

/// Parsed frontmatter from a Markdown source file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Output path override
    #[serde(default)]
    pub permalink: Option<String>,

    /// Whether the page is built at all
    #[serde(default = "default_true")]
    pub published: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: None,
            permalink: None,
            published: true,
        }
    }
}

const DELIMITER: &str = "---";

/// Split a leading `---` block off a Markdown source and parse it.
///
/// The block opens on the first non-blank line and closes at the next line
/// that is exactly `---`. Sources without a block are returned whole with
/// `None`. An empty block parses as [`Frontmatter::default`].
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let mut lines = numbered_lines(source).skip_while(|(_, _, line)| line.trim().is_empty());

    let Some((open, yaml_start, first)) = lines.next() else {
        return Ok((None, source));
    };
    if first.trim_end() != DELIMITER {
        return Ok((None, source));
    }
    let yaml_start = yaml_start + first.len();

    let Some((_, yaml_end, closing)) = lines.find(|(_, _, line)| line.trim_end() == DELIMITER)
    else {
        return Err(FrontmatterError::Unclosed { line: open });
    };

    let yaml = &source[yaml_start..yaml_end];
    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|err| FrontmatterError::InvalidYaml {
            line: open + err.location().map_or(1, |at| at.line()),
            message: err.to_string(),
        })?
    };

    let body = &source[yaml_end + closing.len()..];
    Ok((Some(frontmatter), body.trim_start_matches(['\r', '\n'])))
}

/// One-based line number, byte offset, and text (with terminator) of each line.
fn numbered_lines(source: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    source
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let at = *offset;
            *offset += line.len();
            Some((at, line))
        })
        .enumerate()
        .map(|(index, (at, line))| (index + 1, at, line))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block opened on line {line}")]
    Unclosed { line: usize },

    #[error("Invalid YAML in frontmatter on line {line}: {message}")]
    InvalidYaml { line: usize, message: String },
}
