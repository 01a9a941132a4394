use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// StoreError
///
/// Failure taxonomy of the persistence layer. Repository methods surface either
/// "the row you asked for is not there" or the backend's own message verbatim;
/// handlers decide which HTTP status each one maps to per endpoint.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Wire shape of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

/// ApiError
///
/// Handler-level error. Converting into a response yields the JSON `{error}`
/// envelope with the matching status; backend messages pass through unchanged
/// so the admin UI can show what the store actually said.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Path id failed the canonical UUID shape check. Fixed message by contract.
    #[error("Invalid ID")]
    InvalidId,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Store rejection surfaced as a client error (the admin UI treats these
    /// as form-level failures).
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// The 401 produced by the session extractor and the `/api` gate.
    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized("unauthenticated".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard result type for handler functions.
pub type ApiResult<T> = Result<T, ApiError>;
