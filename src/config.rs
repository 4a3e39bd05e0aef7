use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default capacity of the pipe between the encoder and the response body
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Default gzip level, matching the usual `gzip -6`
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Command-line and environment options
#[derive(Debug, Parser)]
#[command(name = "tarserve", version, about = "Serve directories as tar archives streamed on demand")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LISTEN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "LISTEN_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory whose children are served (defaults to the working directory)
    #[arg(short, long, env = "SERVE_ROOT")]
    pub root: Option<PathBuf>,

    /// Bytes buffered between the archive encoder and the HTTP response
    #[arg(long, env = "PIPE_CAPACITY", default_value_t = DEFAULT_PIPE_CAPACITY)]
    pub pipe_capacity: usize,

    /// Gzip level (0-9) for .tar.gz downloads
    #[arg(long, env = "GZIP_LEVEL", default_value_t = DEFAULT_GZIP_LEVEL,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    pub gzip_level: u32,
}

/// Immutable server configuration, fixed once at startup
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Canonical path of the served root
    pub root: PathBuf,
    pub listen: SocketAddr,
    pub pipe_capacity: usize,
    pub gzip_level: u32,
}

impl ServeConfig {
    /// Configuration rooted at `root` with default tuning, used by tests and embedders
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ServeConfig {
            root: root.into(),
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            gzip_level: DEFAULT_GZIP_LEVEL,
        }
    }

    /// Resolve parsed arguments into a configuration
    pub fn from_args(args: Args) -> Result<Self> {
        let root = match args.root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to get the current directory")?,
        };
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve served root {}", root.display()))?;
        if !root.is_dir() {
            return Err(anyhow!("Served root is not a directory: {}", root.display()));
        }

        if args.pipe_capacity == 0 {
            return Err(anyhow!("Pipe capacity must be greater than zero"));
        }

        Ok(ServeConfig {
            root,
            listen: SocketAddr::new(args.bind, args.port),
            pipe_capacity: args.pipe_capacity,
            gzip_level: args.gzip_level,
        })
    }
}
