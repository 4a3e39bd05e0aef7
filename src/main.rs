use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tarserve::config::{Args, ServeConfig};
use tarserve::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // An unparsable LISTEN_PORT ends the process here
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tarserve=info,warp=info")),
        )
        .init();

    let config = Arc::new(ServeConfig::from_args(args)?);

    let routes = server::routes(Arc::clone(&config));
    let (addr, serving) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.listen, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    println!("{}", "=".repeat(60).cyan());
    println!("{}", "  tarserve - directories as streamed tarballs".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!();
    println!("Serving directory: {}", config.root.display().to_string().bold());
    println!("Listening on http://{}", addr.to_string().bold());
    println!();

    serving.await;

    info!("Shut down");
    Ok(())
}
