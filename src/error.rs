use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{cache::CacheError, models::SelectorError};

/// AppError
///
/// Failures a monitoring handler can surface. Client mistakes keep their
/// message; server-side failures are logged and answered with a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    InvalidSelection(#[from] SelectorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidSelection(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
