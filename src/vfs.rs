use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

/// An immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry (the listed directory joined with the entry name).
    pub path: PathBuf,
    /// Whether the entry is a directory. Symbolic links are not followed.
    pub is_dir: bool,
}

/// The filesystem operations the deployer needs.
///
/// Every call hits the backing store directly; implementations must not cache
/// listings between calls.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the immediate entries of `path`, in whatever order the store reports them.
    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Creates `path` and every missing ancestor. Succeeds if it already exists.
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Copies `from` to `to` byte-for-byte, overwriting `to`. Returns the number of bytes copied.
    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Writes `contents` to `path`, truncating any previous content.
    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The real filesystem, relative paths resolved against the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .map(|entry| -> io::Result<DirEntry> {
                let entry = entry?;

                Ok(DirEntry {
                    path: entry.path().to_path_buf(),
                    is_dir: entry.file_type().is_dir(),
                })
            })
            .collect()
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// A node held by [`MemoryFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualEntry {
    Directory,
    File(Vec<u8>),
}

/// An in-memory [`FileSystem`] keyed by path.
///
/// The empty path is the root and always exists as a directory. Listings come
/// back in path order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryFs {
    entries: BTreeMap<PathBuf, VirtualEntry>,
}
impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a file at `path`, creating its ancestors. Meant for staging fixtures.
    pub fn insert_file<P: AsRef<Path>>(&mut self, path: P, contents: &[u8]) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        self.write_file(path, contents)
    }

    pub fn read<P: AsRef<Path>>(&self, path: P) -> Option<&[u8]> {
        match self.entries.get(path.as_ref()) {
            Some(VirtualEntry::File(contents)) => Some(contents.as_slice()),
            _ => None,
        }
    }

    /// Every stored path under `root`, directories included.
    pub fn paths_under<P: AsRef<Path>>(&self, root: P) -> Vec<&Path> {
        let root = root.as_ref();

        self.entries
            .keys()
            .filter(|path| path.starts_with(root))
            .map(PathBuf::as_path)
            .collect()
    }

    fn is_root(path: &Path) -> bool {
        path.as_os_str().is_empty()
    }

    fn ensure_parent_dir(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));

        if self.is_dir(parent) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent directory '{}' does not exist", parent.display()),
            ))
        }
    }

    fn store_file(&mut self, path: &Path, contents: Vec<u8>) -> io::Result<()> {
        self.ensure_parent_dir(path)?;

        if let Some(VirtualEntry::Directory) = self.entries.get(path) {
            return Err(io::Error::other(format!(
                "'{}' is a directory",
                path.display()
            )));
        }

        self.entries
            .insert(path.to_path_buf(), VirtualEntry::File(contents));

        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        MemoryFs::is_root(path) || self.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        MemoryFs::is_root(path) || matches!(self.entries.get(path), Some(VirtualEntry::Directory))
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if !self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' does not exist", path.display()),
            ));
        }
        if !self.is_dir(path) {
            return Err(io::Error::other(format!(
                "'{}' is not a directory",
                path.display()
            )));
        }

        let listed = self
            .entries
            .iter()
            .filter(|(candidate, _)| candidate.parent() == Some(path))
            .map(|(candidate, entry)| DirEntry {
                path: candidate.clone(),
                is_dir: matches!(entry, VirtualEntry::Directory),
            })
            .collect();

        Ok(listed)
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        let mut missing: Vec<&Path> = path
            .ancestors()
            .filter(|ancestor| !MemoryFs::is_root(ancestor))
            .collect();
        missing.reverse();

        for ancestor in missing {
            match self.entries.get(ancestor) {
                Some(VirtualEntry::Directory) => {}
                Some(VirtualEntry::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("'{}' exists and is not a directory", ancestor.display()),
                    ));
                }
                None => {
                    self.entries
                        .insert(ancestor.to_path_buf(), VirtualEntry::Directory);
                }
            }
        }

        Ok(())
    }

    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<u64> {
        let contents = match self.entries.get(from) {
            Some(VirtualEntry::File(contents)) => contents.clone(),
            Some(VirtualEntry::Directory) => {
                return Err(io::Error::other(format!(
                    "'{}' is a directory",
                    from.display()
                )));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("'{}' does not exist", from.display()),
                ));
            }
        };

        let copied = contents.len() as u64;

        self.store_file(to, contents)?;

        Ok(copied)
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.store_file(path, contents.to_vec())
    }
}
