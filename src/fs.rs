//! Filesystem access used by the organizer.
//!
//! The organizer only ever needs five operations: list a directory, check
//! whether a path is taken, check whether it is a directory, create a
//! directory tree and rename a file. They are collected in the [`FileSystem`]
//! trait so the same scan-and-move logic runs against the real disk
//! ([`RealFileSystem`]) or an in-memory tree ([`MemoryFileSystem`]).

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One immediate child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name exactly as the OS reports it; it need not be UTF-8.
    pub name: OsString,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Whether the entry is a directory (symlinks are followed).
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, path: PathBuf, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            path,
            is_dir,
        }
    }

    /// The name for messages and reports, lossily converted to UTF-8.
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }

    /// Whether the name starts with the hidden-entry marker `.`.
    pub fn is_hidden(&self) -> bool {
        self.name.as_encoded_bytes().first() == Some(&b'.')
    }

    /// Lowercased text after the last `.` of the name, empty if there is none.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }
}

/// Lowercased text after the last `.` of `name`, or an empty string.
///
/// Works on the raw bytes of the name, so names that are not valid UTF-8
/// still yield their extension.
///
/// # Examples
///
/// ```
/// use downtidy::fs::file_extension;
///
/// assert_eq!(file_extension("photo.JPG"), "jpg");
/// assert_eq!(file_extension("backup.tar.gz"), "gz");
/// assert_eq!(file_extension("README"), "");
/// ```
pub fn file_extension(name: impl AsRef<OsStr>) -> String {
    let bytes = name.as_ref().as_encoded_bytes();
    match bytes.iter().rposition(|&b| b == b'.') {
        Some(idx) => String::from_utf8_lossy(&bytes[idx + 1..]).to_lowercase(),
        None => String::new(),
    }
}

/// The operations the organizer performs against a filesystem.
pub trait FileSystem {
    /// Lists the immediate children of `path`.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Whether anything occupies `path`. Symlinks are not followed, so a
    /// dangling link still counts.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory (symlinks are followed).
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Moves `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            entries.push(DirEntry {
                name: entry.file_name(),
                is_dir: path.is_dir(),
                path,
            });
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(
                    "rename {} crosses devices, copying instead",
                    from.display()
                );
                copy_then_remove(from, to, e)
            }
            other => other,
        }
    }
}

/// Cross-device move. Never overwrites `to`, and removes whatever it wrote
/// there if the copy fails partway or the source cannot be deleted, so the
/// caller sees either a completed move or an error with nothing left behind.
fn copy_then_remove(from: &Path, to: &Path, rename_error: io::Error) -> io::Result<()> {
    if fs::symlink_metadata(from)?.is_dir() {
        return Err(rename_error);
    }
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// In-memory [`FileSystem`] for tests.
///
/// Paths are stored as given; use absolute paths such as `/downloads` to keep
/// things unambiguous. Every successful `create_dir_all` or `rename` bumps
/// [`mutations`](Self::mutations), and [`deny_rename`](Self::deny_rename)
/// makes a specific source path fail to move.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    denied: RefCell<HashSet<PathBuf>>,
    mutations: Cell<usize>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory and its parents. Does not count as a mutation.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    /// Adds a file (and its parent directories). Does not count as a mutation.
    pub fn add_file(&self, path: impl AsRef<Path>, content: &[u8]) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes
            .borrow_mut()
            .insert(path.to_path_buf(), Node::File(content.to_vec()));
    }

    /// Makes any later `rename` from `path` fail with `PermissionDenied`.
    pub fn deny_rename(&self, path: impl AsRef<Path>) {
        self.denied.borrow_mut().insert(path.as_ref().to_path_buf());
    }

    /// Whether `path` holds a file.
    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        matches!(
            self.nodes.borrow().get(path.as_ref()),
            Some(Node::File(_))
        )
    }

    /// Content of the file at `path`.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.nodes.borrow().get(path.as_ref()) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Every path currently present, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.nodes.borrow().keys().cloned().collect()
    }

    /// Number of successful mutating calls so far.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    fn bump(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes.borrow();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", path.display()),
                ));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                ));
            }
        }

        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| DirEntry {
                name: p.file_name().map(OsStr::to_os_string).unwrap_or_default(),
                path: p.clone(),
                is_dir: *node == Node::Dir,
            })
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.borrow().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.borrow().get(path), Some(Node::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        {
            let nodes = self.nodes.borrow();
            if let Some(file) = path
                .ancestors()
                .find(|a| matches!(nodes.get(*a), Some(Node::File(_))))
            {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", file.display()),
                ));
            }
            if nodes.get(path) == Some(&Node::Dir) {
                return Ok(());
            }
        }
        self.add_dir(path);
        self.bump();
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.denied.borrow().contains(from) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", from.display()),
            ));
        }

        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(from) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", from.display()),
            ));
        }
        if let Some(parent) = to.parent()
            && nodes.get(parent) != Some(&Node::Dir)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", parent.display()),
            ));
        }

        // Move the node and, for directories, everything beneath it.
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
                let new = if suffix.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(suffix)
                };
                nodes.insert(new, node);
            }
        }
        drop(nodes);
        self.bump();
        Ok(())
    }
}
