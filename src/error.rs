//! Error types for archive requests.
//!
//! Validation failures ([`BadRequest`], [`NotFound`]) are detected before any
//! bytes are sent and map directly onto HTTP status codes. [`Io`] covers every
//! filesystem or pipe failure; once a response has started streaming it can
//! only be surfaced by truncating the archive.
//!
//! [`BadRequest`]: ArchiveError::BadRequest
//! [`NotFound`]: ArchiveError::NotFound
//! [`Io`]: ArchiveError::Io

use warp::http::StatusCode;

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The requested archive name is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The directory behind an archive name does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem, pipe or encoder failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// HTTP status reported when the error is raised before streaming starts.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArchiveError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ArchiveError::NotFound(_) => StatusCode::NOT_FOUND,
            ArchiveError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error was caused by the reading side going away.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ArchiveError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(e: walkdir::Error) -> Self {
        ArchiveError::Io(e.into())
    }
}
