//! Errors raised while applying a sync operation

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use std::path::PathBuf;
use sync_core::{IndexError, PathError};
use thiserror::Error;
use tracing::error;

/// Apply failure, mapped onto an HTTP status by [`IntoResponse`]
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Requested path does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Path escapes the root or is not valid UTF-8
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The root itself cannot be replaced or removed
    #[error("refusing to modify the sync root")]
    RootMutation,

    /// POST with a content type other than file content or `directory`
    #[error("Unsupported Content-Type: {0}")]
    UnsupportedContentType(String),

    /// Any method other than GET, POST and DELETE
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Local filesystem operation failed
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Computing the checksum index failed
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The post-sync command could not run or exited unsuccessfully
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApplyError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidPath(_) | Self::RootMutation | Self::UnsupportedContentType(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io { .. } | Self::Index(_) | Self::Command { .. } | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApplyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self);
            format!("Internal server error: {}", self)
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}
