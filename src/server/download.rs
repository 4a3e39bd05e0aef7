use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_TYPE};
use warp::http::{HeaderValue, Response, StatusCode};
use warp::hyper::Body;

use super::{error_response, text_response};
use crate::archive::{ArchiveRequest, ArchiveStream};
use crate::config::ServeConfig;

/// `GET /<archive name>`: validate the name and stream the archive
///
/// Validation errors are reported with their status code. Once streaming has
/// started the length is unknown and failures can only truncate the body.
pub async fn download(
    archive_name: String,
    config: Arc<ServeConfig>,
) -> Result<Response<Body>, Infallible> {
    let request = match ArchiveRequest::parse(&archive_name) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected {:?}: {}", archive_name, e);
            return Ok(error_response(&e));
        }
    };

    // The existence check stats the directory, so it runs off the executor
    let spawn_request = request.clone();
    let started =
        tokio::task::spawn_blocking(move || ArchiveStream::spawn(&config, &spawn_request)).await;

    let stream = match started {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!("Rejected {:?}: {}", archive_name, e);
            return Ok(error_response(&e));
        }
        Err(e) => {
            error!("Archive start task failed: {}", e);
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "archive failed to start".to_string(),
            ));
        }
    };

    info!("Streaming {} from {}", request.file_name(), request.dir);

    let mut response = Response::new(Body::wrap_stream(ReaderStream::new(stream)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-tar"));
    if let Some(encoding) = request.format.content_encoding() {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
    }
    let file_name = request.file_name().replace('"', "\\\"");
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
    {
        headers.insert(CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}
