//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so every handler maps
//! engine errors to the same status codes and error shapes.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use verdict_engine::EngineError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(message) => api_error(StatusCode::NOT_FOUND, "not_found", &message),
            EngineError::AlreadyExists(message) => {
                api_error(StatusCode::CONFLICT, "already_exists", &message)
            }
            EngineError::InvalidInput(message) => {
                api_error(StatusCode::BAD_REQUEST, "invalid_input", &message)
            }
            EngineError::ServiceUnavailable(message) => {
                api_error(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", &message)
            }
            EngineError::Storage(cause) => {
                tracing::error!(error = ?cause, "repository failure");
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "storage failure",
                )
            }
        }
    }
}

pub fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "invalid_input", message)
}

pub fn api_model_unavailable(model: &str) -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "service_unavailable",
        &format!("no engine configured for model {model}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_expected_statuses() {
        let cases = [
            (EngineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (EngineError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (EngineError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                EngineError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EngineError::Storage(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
