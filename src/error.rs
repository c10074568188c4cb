use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Failure of a store operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matches the requested key
    #[error("key not found: {0}")]
    NotFound(String),
    /// The store rejected or failed a statement
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

/// Custom error type for API endpoints
///
/// The only place internal failures are turned into HTTP statuses. A
/// missing key is a 404; everything else collapses to a generic 500.
#[derive(Debug)]
pub enum ApiError {
    /// Key not found in the store
    KeyNotFound(String),
    /// Store operation error
    StoreError(StoreError),
    /// Request body does not match `{"name", "value"}`
    RequestParseError(serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::KeyNotFound(key) => {
                tracing::info!("key not found: {}", key);
                (StatusCode::NOT_FOUND, "<h1>not found</h1>")
            }
            ApiError::StoreError(err) => {
                tracing::error!("store error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "<h1>error</h1>")
            }
            ApiError::RequestParseError(err) => {
                tracing::error!("request parse error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "<h1>error</h1>")
            }
        };

        (status, Html(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => ApiError::KeyNotFound(key),
            other => ApiError::StoreError(other),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::RequestParseError(err)
    }
}
