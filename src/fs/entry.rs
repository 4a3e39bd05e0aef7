use std::ffi::OsString;
use std::fs::{File, Metadata};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

/// Kind of a walked filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Symbolic link, never followed; carries the link target
    Symlink(PathBuf),
}

/// One entry produced by the walker
///
/// File entries carry their opened byte source. It is read once and closed
/// when the entry (or the source taken out of it) is dropped.
#[derive(Debug)]
pub struct FsEntry {
    /// Path relative to the served root, e.g. `photos/2024/a.jpg`
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Content length; always zero for directories and symlinks
    pub size: u64,
    /// Permission bits
    pub mode: u32,
    /// Modification time in seconds since the epoch
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
    source: Option<File>,
}

impl FsEntry {
    /// Build a directory entry from its metadata
    pub fn directory(path: PathBuf, metadata: &Metadata) -> Self {
        Self::from_metadata(path, EntryKind::Directory, metadata, 0, None)
    }

    /// Build a file entry owning its opened source
    pub fn file(path: PathBuf, metadata: &Metadata, source: File) -> Self {
        Self::from_metadata(path, EntryKind::File, metadata, metadata.len(), Some(source))
    }

    /// Build a symlink entry pointing at `target`
    pub fn symlink(path: PathBuf, metadata: &Metadata, target: PathBuf) -> Self {
        Self::from_metadata(path, EntryKind::Symlink(target), metadata, 0, None)
    }

    fn from_metadata(
        path: PathBuf,
        kind: EntryKind,
        metadata: &Metadata,
        size: u64,
        source: Option<File>,
    ) -> Self {
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let (mode, uid, gid) = ownership(&kind, metadata);

        FsEntry {
            path,
            kind,
            size,
            mode,
            mtime,
            uid,
            gid,
            source,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Name recorded in the archive: directories get a trailing `/`
    pub fn archive_path(&self) -> PathBuf {
        if self.is_dir() {
            let mut name = OsString::from(self.path.as_os_str());
            name.push("/");
            PathBuf::from(name)
        } else {
            self.path.clone()
        }
    }

    /// Take the byte source out of a file entry
    ///
    /// Returns `None` for directories, symlinks, or when already taken.
    pub fn take_source(&mut self) -> Option<File> {
        self.source.take()
    }

    /// Relative path as shown in logs
    pub fn display(&self) -> std::path::Display<'_> {
        self.path.display()
    }
}

#[cfg(unix)]
fn ownership(_kind: &EntryKind, metadata: &Metadata) -> (u32, u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (metadata.mode() & 0o7777, metadata.uid() as u64, metadata.gid() as u64)
}

#[cfg(not(unix))]
fn ownership(kind: &EntryKind, metadata: &Metadata) -> (u32, u64, u64) {
    let mode = match kind {
        EntryKind::Directory => 0o755,
        EntryKind::Symlink(_) => 0o777,
        EntryKind::File if metadata.permissions().readonly() => 0o444,
        EntryKind::File => 0o644,
    };
    (mode, 0, 0)
}
