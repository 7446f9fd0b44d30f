//! Error types for the user pool API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use userpool_auth_core::ProviderError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Provider error codes that mean the caller, not the service, is at fault
fn provider_code_is_unauthorized(code: &str) -> bool {
    matches!(code, "NotAuthorizedException" | "UserNotFoundException")
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Provider(ProviderError::Api { code, .. })
                if provider_code_is_unauthorized(code) =>
            {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Provider(ProviderError::Api { code, .. })
                if provider_code_is_unauthorized(code) =>
            {
                "UNAUTHORIZED"
            }
            Self::Internal(_) | Self::Provider(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the caller. Credential failures surface the
    /// provider's message alone; other provider errors keep the code.
    fn public_message(&self) -> String {
        match self {
            Self::Provider(ProviderError::Api { code, message })
                if provider_code_is_unauthorized(code) =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
