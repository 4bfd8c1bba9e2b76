//! API error type and its mapping to HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use laterna_types::api::{ErrorBody, ErrorDetail};

use laterna_db::CreateUserError;

use crate::chat::ChatError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NotAuthenticated => ApiError::Unauthorized,
            ChatError::Validation(msg) => ApiError::Validation(msg),
            ChatError::NotFound(msg) => ApiError::NotFound(msg),
            ChatError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<CreateUserError> for ApiError {
    fn from(e: CreateUserError) -> Self {
        match e {
            CreateUserError::UsernameTaken(name) => {
                ApiError::Conflict(format!("username '{}' is taken", name))
            }
            CreateUserError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Internal details stay in the log
        let message = match self {
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (ChatError::Validation("empty".into()), StatusCode::BAD_REQUEST),
            (ChatError::NotFound("ghost".into()), StatusCode::NOT_FOUND),
            (
                ChatError::Storage(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn taken_username_is_a_conflict() {
        let err = ApiError::from(CreateUserError::UsernameTaken("alice".into()));
        assert!(matches!(&err, ApiError::Conflict(msg) if msg.contains("alice")));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
