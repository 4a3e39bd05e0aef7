pub mod metrics;
pub mod name;
pub mod stream;
pub mod tar;

pub use metrics::ArchiveMetrics;
pub use name::ArchiveRequest;
pub use stream::ArchiveStream;
pub use self::tar::{TarEncoder, encode};

/// Archive formats that can be served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
}

impl ArchiveFormat {
    pub const TAR_SUFFIX: &'static str = ".tar";
    pub const GZIP_SUFFIX: &'static str = ".gz";

    /// Whether the tar stream is wrapped in gzip
    pub fn is_compressed(self) -> bool {
        matches!(self, ArchiveFormat::TarGz)
    }

    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::TarGz => ".tar.gz",
        }
    }

    /// Value of the `Content-Encoding` header, if any
    pub fn content_encoding(self) -> Option<&'static str> {
        match self {
            ArchiveFormat::Tar => None,
            ArchiveFormat::TarGz => Some("gzip"),
        }
    }
}
