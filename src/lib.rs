//! Serve directories as tar and tar.gz archives generated on demand.
//!
//! Archives are never materialized: a [`fs::Walker`] feeds entries to the
//! [`archive::TarEncoder`] on a blocking thread, which writes through a bounded
//! pipe that the HTTP response drains ([`archive::ArchiveStream`]).

pub mod archive;
pub mod config;
pub mod error;
pub mod fs;
pub mod server;

pub use archive::{ArchiveFormat, ArchiveRequest, ArchiveStream};
pub use config::ServeConfig;
pub use error::{ArchiveError, Result};
