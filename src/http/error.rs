//! HTTP error handling and response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Error response body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Malformed request (unparseable date, missing fields).
    BadRequest(String),
    /// Well-formed but out-of-range field values.
    Unprocessable(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    /// Same as `From<EngineError>` but with the extension-specific overlap message.
    pub fn from_extend(err: EngineError) -> Self {
        match err {
            EngineError::Overlap(_) => AppError::Conflict("Extension overlaps another booking".into()),
            EngineError::InvalidInterval { .. } => {
                AppError::BadRequest("New end must be after start".into())
            }
            other => other.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownResource(_) => AppError::NotFound("Unknown resource_id".into()),
            EngineError::InvalidInterval { .. } => {
                AppError::BadRequest("End must be after start".into())
            }
            EngineError::InvalidName => AppError::BadRequest("Name must not be empty".into()),
            EngineError::Overlap(_) => {
                AppError::Conflict("Booking overlaps existing reservation".into())
            }
            EngineError::NotFound(_) => AppError::NotFound("Booking not found".into()),
            EngineError::WalError(e) => AppError::Internal(format!("storage failure: {e}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ApiError { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::UnknownResource(9), StatusCode::NOT_FOUND),
            (EngineError::InvalidInterval { start: 5, end: 5 }, StatusCode::BAD_REQUEST),
            (EngineError::InvalidName, StatusCode::BAD_REQUEST),
            (EngineError::Overlap(1), StatusCode::CONFLICT),
            (EngineError::NotFound(1), StatusCode::NOT_FOUND),
            (EngineError::WalError("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn extend_overlap_has_own_message() {
        match AppError::from_extend(EngineError::Overlap(3)) {
            AppError::Conflict(msg) => assert_eq!(msg, "Extension overlaps another booking"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AppError::from_extend(EngineError::NotFound(3)),
            AppError::NotFound(_)
        ));
    }
}
