use std::path::Path;

use super::ArchiveFormat;
use crate::error::{ArchiveError, Result};
use crate::fs::Walker;

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    /// Name of the served child directory
    pub dir: String,
    pub format: ArchiveFormat,
}

impl ArchiveRequest {
    /// Parse an archive file name such as `photos.tar` or `photos.tar.gz`
    ///
    /// Only checks the shape of the name; see [`ArchiveRequest::resolve`] for
    /// the existence check.
    pub fn parse(archive_name: &str) -> Result<Self> {
        // Cowardly refuse anything that is not a single path component
        if archive_name.contains(['/', '\\', '\0']) {
            return Err(ArchiveError::BadRequest("Invalid file name".to_string()));
        }

        let (stem, format) = match archive_name.strip_suffix(ArchiveFormat::GZIP_SUFFIX) {
            Some(stem) => (stem, ArchiveFormat::TarGz),
            None => (archive_name, ArchiveFormat::Tar),
        };

        let dir = stem
            .strip_suffix(ArchiveFormat::TAR_SUFFIX)
            .ok_or_else(|| ArchiveError::BadRequest("Invalid file extension".to_string()))?;

        // ".tar", "..tar" and "...tar" would name the root or its parent
        if dir.is_empty() || dir == "." || dir == ".." {
            return Err(ArchiveError::BadRequest("Invalid file name".to_string()));
        }

        Ok(ArchiveRequest {
            dir: dir.to_string(),
            format,
        })
    }

    /// Parse an archive name and check its directory exists under `root`
    pub fn resolve(archive_name: &str, root: &Path) -> Result<Self> {
        let request = Self::parse(archive_name)?;
        request.walker(root)?;
        Ok(request)
    }

    /// Walker over the requested directory
    pub fn walker(&self, root: &Path) -> Result<Walker> {
        Walker::new(root, &self.dir)
    }

    /// File name offered to the client, e.g. `photos.tar.gz`
    pub fn file_name(&self) -> String {
        format!("{}{}", self.dir, self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_request(name: &str) -> bool {
        matches!(ArchiveRequest::parse(name), Err(ArchiveError::BadRequest(_)))
    }

    #[test]
    fn test_parse_tar() {
        let req = ArchiveRequest::parse("foo.tar").unwrap();
        assert_eq!(req.dir, "foo");
        assert_eq!(req.format, ArchiveFormat::Tar);
        assert!(!req.format.is_compressed());
    }

    #[test]
    fn test_parse_tar_gz() {
        let req = ArchiveRequest::parse("foo.tar.gz").unwrap();
        assert_eq!(req.dir, "foo");
        assert_eq!(req.format, ArchiveFormat::TarGz);
        assert!(req.format.is_compressed());
    }

    #[test]
    fn test_dotted_directory_names() {
        assert_eq!(ArchiveRequest::parse("v1.2.tar").unwrap().dir, "v1.2");
        assert_eq!(ArchiveRequest::parse(".config.tar.gz").unwrap().dir, ".config");
        assert_eq!(ArchiveRequest::parse("backup.tar.tar").unwrap().dir, "backup.tar");
    }

    #[test]
    fn test_rejects_separators() {
        assert!(bad_request("../etc.tar"));
        assert!(bad_request("a/b.tar"));
        assert!(bad_request("a\\b.tar"));
        assert!(bad_request("/abs.tar.gz"));
    }

    #[test]
    fn test_rejects_bad_extensions() {
        assert!(bad_request("foo.zip"));
        assert!(bad_request("foo"));
        assert!(bad_request("foo.gz"));
        assert!(bad_request("foo.tgz"));
        assert!(bad_request("foo.tar.gz.gz"));
        assert!(bad_request("foo.TAR"));
    }

    #[test]
    fn test_rejects_root_and_parent() {
        assert!(bad_request(".tar"));
        assert!(bad_request(".tar.gz"));
        assert!(bad_request("..tar"));
        assert!(bad_request("...tar"));
    }

    #[test]
    fn test_file_name_round_trips() {
        for name in ["foo.tar", "foo.tar.gz", "my dir.tar.gz"] {
            assert_eq!(ArchiveRequest::parse(name).unwrap().file_name(), name);
        }
    }

    #[test]
    fn test_resolve_checks_existence() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("present")).unwrap();

        let req = ArchiveRequest::resolve("present.tar.gz", root.path()).unwrap();
        assert_eq!(req.dir, "present");

        let err = ArchiveRequest::resolve("missingdir.tar", root.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));

        // Malformed names are rejected before touching the filesystem
        let err = ArchiveRequest::resolve("missingdir.zip", root.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::BadRequest(_)));
    }
}
