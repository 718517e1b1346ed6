//! Flags shared by every pipeline operation.

/// Options read by [`crate::clean`], [`crate::build`] and
/// [`crate::write_page`]. Constructed once per invocation and passed by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Report every mutation on the log sink instead of performing it.
    pub dry_run: bool,

    /// Hard-link static pages from the source tree instead of copying them.
    pub use_hard_links: bool,
}

impl BuildOptions {
    /// Options for a dry run.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}
