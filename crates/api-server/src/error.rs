//! Error type shared by the REST handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use storefront_core::StorefrontError;
use storefront_quiz::QuizError;
use thiserror::Error;
use tracing::error;

use crate::rest::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Storefront(#[from] StorefrontError),
}

impl ApiError {
    /// HTTP status and stable machine-readable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Quiz(e) => match e {
                QuizError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
                QuizError::NotInProgress { .. } | QuizError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "invalid_quiz_state")
                }
                QuizError::UnknownFlow(_) => (StatusCode::BAD_REQUEST, "unknown_flow"),
                QuizError::UnknownAnswerKey(_) => (StatusCode::BAD_REQUEST, "unknown_answer_key"),
                QuizError::StoreFull(_) => (StatusCode::SERVICE_UNAVAILABLE, "session_capacity"),
                QuizError::InvalidCatalog(_) | QuizError::Document(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "catalog_error")
                }
            },
            ApiError::Storefront(e) => match e {
                StorefrontError::InvalidSlug(_) => (StatusCode::BAD_REQUEST, "invalid_slug"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "content_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!(error = %self, code, "Request failed");
            metrics::counter!("api.errors").increment(1);
            "Internal processing error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_error_statuses() {
        let cases = [
            (QuizError::SessionNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                QuizError::NotInProgress {
                    state: "completed".into(),
                },
                StatusCode::CONFLICT,
            ),
            (QuizError::UnknownFlow("x".into()), StatusCode::BAD_REQUEST),
            (QuizError::UnknownAnswerKey("x".into()), StatusCode::BAD_REQUEST),
            (QuizError::StoreFull(1), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_and_code().0, status);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response =
            ApiError::from(StorefrontError::Io(std::io::Error::other("disk on fire")))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
