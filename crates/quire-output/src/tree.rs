//! Directory traversal used by the cleaner and the pruner.
//!
//! [`Tree`] yields one [`Visit`] per entry instead of driving a callback, so
//! the deletion logic can run against [`DiskTree`] or an in-memory
//! [`MemoryTree`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Kind of a visited entry. Symlinks are reported as files and never
/// followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// An entry that existed when it was visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Outcome of visiting one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    Found(Entry),
    /// The path disappeared before it could be inspected.
    Missing(PathBuf),
}

/// Traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Parents before their contents, siblings sorted by name.
    Preorder,
    /// Contents before their parent directory.
    ContentsFirst,
}

/// A traversal or filesystem failure other than "not found".
#[derive(Debug, thiserror::Error)]
#[error("{}: {source}", path.display())]
pub struct TreeError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A directory tree the pipeline can walk and delete from.
pub trait Tree {
    /// Walk `root` and everything beneath it, `root` included.
    fn walk<'a>(
        &'a self,
        root: &Path,
        order: Order,
    ) -> Box<dyn Iterator<Item = Result<Visit, TreeError>> + 'a>;

    /// Whether the directory at `path` has no entries.
    fn is_empty_dir(&self, path: &Path) -> io::Result<bool>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskTree;

impl Tree for DiskTree {
    fn walk<'a>(
        &'a self,
        root: &Path,
        order: Order,
    ) -> Box<dyn Iterator<Item = Result<Visit, TreeError>> + 'a> {
        let root = root.to_path_buf();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .contents_first(order == Order::ContentsFirst);

        Box::new(walker.into_iter().map(move |result| match result {
            Ok(entry) => {
                let kind = if entry.file_type().is_dir() {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                };
                Ok(Visit::Found(Entry {
                    path: entry.into_path(),
                    kind,
                }))
            }
            Err(err) => {
                let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                let loop_message = err.to_string();
                match err.into_io_error() {
                    Some(source) if source.kind() == io::ErrorKind::NotFound => {
                        Ok(Visit::Missing(path))
                    }
                    Some(source) => Err(TreeError { path, source }),
                    None => Err(TreeError {
                        path,
                        source: io::Error::new(io::ErrorKind::Other, loop_message),
                    }),
                }
            }
        }))
    }

    fn is_empty_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::read_dir(path)?.next().is_none())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    File,
    Dir,
}

/// An in-memory directory tree with injectable failures.
///
/// Walks take a snapshot of the paths under the root and look each one up
/// again when it is yielded, so entries removed mid-walk are reported as
/// [`Visit::Missing`].
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    walk_faults: RefCell<BTreeMap<PathBuf, io::ErrorKind>>,
    remove_faults: RefCell<BTreeMap<PathBuf, io::ErrorKind>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and any missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes.borrow_mut().insert(path.to_path_buf(), Node::File);
        self
    }

    /// Add a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        self
    }

    /// Make visiting `path` fail with `kind`. `NotFound` reports the entry as
    /// missing, matching [`DiskTree`].
    pub fn fail_walk(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> &Self {
        self.walk_faults.borrow_mut().insert(path.into(), kind);
        self
    }

    /// Make removing `path` fail with `kind`.
    pub fn fail_remove(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> &Self {
        self.remove_faults.borrow_mut().insert(path.into(), kind);
        self
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.borrow().contains_key(path.as_ref())
    }

    /// Every path in the tree, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.nodes.borrow().keys().cloned().collect()
    }

    fn remove_fault(&self, path: &Path) -> io::Result<()> {
        match self.remove_faults.borrow().get(path) {
            Some(kind) => Err(io::Error::new(*kind, "injected failure")),
            None => Ok(()),
        }
    }
}

impl Tree for MemoryTree {
    fn walk<'a>(
        &'a self,
        root: &Path,
        order: Order,
    ) -> Box<dyn Iterator<Item = Result<Visit, TreeError>> + 'a> {
        let mut snapshot: Vec<PathBuf> = self
            .nodes
            .borrow()
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect();
        if snapshot.is_empty() {
            snapshot.push(root.to_path_buf());
        }
        if order == Order::ContentsFirst {
            snapshot.reverse();
        }

        Box::new(snapshot.into_iter().map(move |path| {
            let fault = self.walk_faults.borrow().get(&path).copied();
            if let Some(kind) = fault {
                if kind == io::ErrorKind::NotFound {
                    return Ok(Visit::Missing(path));
                }
                return Err(TreeError {
                    path,
                    source: io::Error::new(kind, "injected failure"),
                });
            }
            let node = self.nodes.borrow().get(&path).copied();
            let kind = match node {
                Some(Node::File) => EntryKind::File,
                Some(Node::Dir) => EntryKind::Dir,
                None => return Ok(Visit::Missing(path)),
            };
            Ok(Visit::Found(Entry { path, kind }))
        }))
    }

    fn is_empty_dir(&self, path: &Path) -> io::Result<bool> {
        let nodes = self.nodes.borrow();
        match nodes.get(path) {
            Some(Node::Dir) => Ok(!nodes.keys().any(|p| p.parent() == Some(path))),
            Some(Node::File) => Err(io::Error::new(io::ErrorKind::Other, "not a directory")),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.remove_fault(path)?;
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(path) {
            Some(Node::File) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::new(io::ErrorKind::Other, "is a directory")),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.remove_fault(path)?;
        if !self.is_empty_dir(path)? {
            return Err(io::Error::new(io::ErrorKind::Other, "directory not empty"));
        }
        self.nodes.borrow_mut().remove(path);
        Ok(())
    }
}
