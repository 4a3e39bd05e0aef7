//! HTTP surface: an index of served directories and one download route.

mod download;
mod index;

use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;
use warp::http::header::CONTENT_TYPE;
use warp::http::{HeaderValue, Response, StatusCode};
use warp::hyper::Body;

use crate::config::ServeConfig;
use crate::error::ArchiveError;

pub use download::download;
pub use index::{index, render_index};

/// All routes, wrapped in request tracing
///
/// - `GET /` lists the served directories
/// - `GET /<name>.tar` and `GET /<name>.tar.gz` stream an archive
pub fn routes(
    config: Arc<ServeConfig>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let index = warp::get()
        .and(warp::path::end())
        .and(with_config(Arc::clone(&config)))
        .and_then(index);

    let download = warp::get()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_config(config))
        .and_then(download);

    index.or(download).with(warp::trace::request())
}

fn with_config(
    config: Arc<ServeConfig>,
) -> impl Filter<Extract = (Arc<ServeConfig>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&config))
}

/// Plain-text error response carrying the error's status
fn error_response(err: &ArchiveError) -> Response<Body> {
    let message = match err {
        ArchiveError::BadRequest(msg) | ArchiveError::NotFound(msg) => msg.clone(),
        ArchiveError::Io(e) => e.to_string(),
    };
    text_response(err.status_code(), message)
}

fn text_response(status: StatusCode, message: String) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
