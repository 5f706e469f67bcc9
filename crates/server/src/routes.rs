//! HTTP surface of the receiving side
//!
//! Every path under the base URL names a location in the mirrored tree:
//! - `GET` returns the checksum index of that subtree as JSON
//! - `POST` with `application/octet-stream` writes file content
//! - `POST` with `directory` ensures a directory exists
//! - `DELETE` removes the path recursively

use crate::applier::ServerApplier;
use crate::config::ServerConfig;
use crate::error::ApplyError;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Extension, Json, Router};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Content type for file bodies
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type marking a directory push
pub const DIRECTORY_CONTENT_TYPE: &str = "directory";

/// Build the router for an applier
pub fn router(applier: Arc<ServerApplier>) -> Router {
    Router::new()
        .route("/", any(root_handler))
        .route("/*path", any(path_handler))
        // File bodies are whole files, not form posts
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(applier))
}

/// Bind the configured address and serve until the process is terminated
pub async fn serve(config: ServerConfig) -> io::Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    serve_on(listener, Arc::new(ServerApplier::from_config(&config))).await
}

/// Serve an applier on an already bound listener
pub async fn serve_on(listener: TcpListener, applier: Arc<ServerApplier>) -> io::Result<()> {
    info!(
        "Serving {} on {}",
        applier.root().display(),
        listener.local_addr()?
    );
    axum::serve(listener, router(applier)).await
}

async fn root_handler(
    Extension(applier): Extension<Arc<ServerApplier>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApplyError> {
    dispatch(&applier, method, "", &headers, body).await
}

async fn path_handler(
    Extension(applier): Extension<Arc<ServerApplier>>,
    method: Method,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApplyError> {
    dispatch(&applier, method, &path, &headers, body).await
}

async fn dispatch(
    applier: &ServerApplier,
    method: Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ApplyError> {
    debug!("{} /{}", method, path);

    match method {
        Method::GET => {
            let index = applier.index(path).await?;
            Ok(Json(index).into_response())
        }
        Method::POST => {
            let output = match content_type(headers) {
                FILE_CONTENT_TYPE => applier.write_file(path, body.to_vec()).await?,
                DIRECTORY_CONTENT_TYPE => applier.ensure_directory(path).await?,
                other => return Err(ApplyError::UnsupportedContentType(other.to_string())),
            };
            Ok(output.into_response())
        }
        Method::DELETE => {
            let output = applier.remove(path).await?;
            Ok(output.into_response())
        }
        _ => Err(ApplyError::MethodNotAllowed),
    }
}

/// Media type of the request without parameters, empty when absent
fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or("")
}
