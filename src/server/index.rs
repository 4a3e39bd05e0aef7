use std::convert::Infallible;
use std::fmt::Write;
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;
use warp::Reply;
use warp::reply::Response;

use super::text_response;
use crate::archive::ArchiveFormat;
use crate::config::ServeConfig;
use crate::fs::list_archivable_dirs;

/// `GET /`: HTML list of directories with links to both archive formats
pub async fn index(config: Arc<ServeConfig>) -> Result<Response, Infallible> {
    let root = config.root.clone();
    let listing = tokio::task::spawn_blocking(move || list_archivable_dirs(&root)).await;

    let dirs = match listing {
        Ok(Ok(dirs)) => dirs,
        Ok(Err(e)) => {
            error!("Failed to list {}: {}", config.root.display(), e);
            return Ok(text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
        Err(e) => {
            error!("Listing task failed: {}", e);
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "listing failed".to_string(),
            ));
        }
    };

    Ok(warp::reply::html(render_index(&dirs)).into_response())
}

/// Render one line per directory
pub fn render_index(dirs: &[String]) -> String {
    let mut html = String::new();
    for dir in dirs {
        let name = escape_html(dir);
        let _ = write!(
            html,
            r#"{name} <a href="/{name}{tar}">tar</a> <a href="/{name}{tgz}">tar.gz</a><br>"#,
            tar = ArchiveFormat::Tar.extension(),
            tgz = ArchiveFormat::TarGz.extension(),
        );
    }
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
