//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

const VERIFICATION_FAILED_MESSAGE: &str = "webhook verification could not be completed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook verification failed: {0}")]
    VerificationFailed(#[from] vgen_webhook::WebhookError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::VerificationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::VerificationFailed(_) => "verification_failed",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Key-fetch details are logged by the handler, never returned.
        let message = match &self {
            ApiError::VerificationFailed(_) => VERIFICATION_FAILED_MESSAGE.to_string(),
            ApiError::Unauthorized(msg) | ApiError::BadRequest(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            error: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(vgen_webhook::WebhookError::invalid_key_set("empty")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_verification_failure_code() {
        let err = ApiError::from(vgen_webhook::WebhookError::invalid_key_set("empty"));
        assert_eq!(err.code(), "verification_failed");
    }

    #[tokio::test]
    async fn test_verification_failure_hides_detail() {
        let err = ApiError::from(vgen_webhook::WebhookError::invalid_key_set("no ed25519 keys"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "verification_failed");
        assert_eq!(body["message"], VERIFICATION_FAILED_MESSAGE);
    }
}
