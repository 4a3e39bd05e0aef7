//! Depth-first traversal of one served directory.
//!
//! Entries come out in a stable order: each directory precedes its children,
//! and siblings are sorted by file name. The filesystem's own iteration order
//! is never relied on, so two walks of an unchanged tree yield the same
//! sequence.

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use super::FsEntry;
use crate::error::{ArchiveError, Result};

/// Walks one immediate child directory of the served root
#[derive(Debug, Clone)]
pub struct Walker {
    /// Served root; entry paths are relative to it
    base: PathBuf,
    /// Name of the child directory being walked
    dir: String,
}

impl Walker {
    /// Create a walker for `base/dir`
    ///
    /// Fails with [`ArchiveError::NotFound`] unless `base/dir` exists and is a
    /// directory itself (a symlink to a directory does not count).
    pub fn new(base: &Path, dir: &str) -> Result<Self> {
        let root = base.join(dir);
        match std::fs::symlink_metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Walker {
                base: base.to_path_buf(),
                dir: dir.to_string(),
            }),
            Ok(_) => Err(ArchiveError::NotFound(format!("{dir} is not a directory"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::NotFound(format!("Folder not found: {dir}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path of the walked directory
    pub fn root(&self) -> PathBuf {
        self.base.join(&self.dir)
    }

    /// Start a fresh walk from the top
    pub fn entries(&self) -> Entries {
        let inner = WalkDir::new(self.root())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Entries {
            inner,
            base: self.base.clone(),
            done: false,
        }
    }
}

/// Lazy sequence of walked entries
///
/// The first error ends the sequence; entries already yielded stay valid.
pub struct Entries {
    inner: walkdir::IntoIter,
    base: PathBuf,
    done: bool,
}

impl Entries {
    fn convert(&self, dent: DirEntry) -> Result<Option<FsEntry>> {
        let relative = dent
            .path()
            .strip_prefix(&self.base)
            .map_err(|_| {
                std::io::Error::other(format!(
                    "walked outside the served root: {}",
                    dent.path().display()
                ))
            })?
            .to_path_buf();

        let metadata = dent.metadata()?;
        let file_type = dent.file_type();

        if file_type.is_dir() {
            Ok(Some(FsEntry::directory(relative, &metadata)))
        } else if file_type.is_file() {
            // Opened here so a vanished file aborts the walk at its position
            let source = File::open(dent.path())?;
            Ok(Some(FsEntry::file(relative, &metadata, source)))
        } else if file_type.is_symlink() {
            let target = std::fs::read_link(dent.path())?;
            Ok(Some(FsEntry::symlink(relative, &metadata, target)))
        } else {
            warn!("Skipping special file {}", relative.display());
            Ok(None)
        }
    }
}

impl Iterator for Entries {
    type Item = Result<FsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let result = match self.inner.next()? {
                Ok(dent) => self.convert(dent),
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
