//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use userpool_auth_core::AuthRequest;

use crate::state::AppState;

/// Authenticated caller extracted from the request's bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal_id: Option<String>,
    pub routes: Vec<String>,
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_bearer_token(parts)?;

        let authorizer = app_state
            .registry
            .get(&app_state.config.auth.authorizer_name)
            .ok_or(AuthRejection {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR",
                message: "Authorizer not registered",
            })?;

        let decision = authorizer
            .authorize(&AuthRequest::new(token))
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Authorization check failed");
                AuthRejection {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "INTERNAL_ERROR",
                    message: "Authorization check failed",
                }
            })?;

        if decision.is_denied() {
            return Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                code: "INVALID_TOKEN",
                message: "Invalid or expired token",
            });
        }

        Ok(AuthUser {
            principal_id: decision.principal_id,
            routes: decision.routes,
        })
    }
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Result<String, AuthRejection> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid Authorization header encoding",
        })?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    Err(AuthRejection {
        status: StatusCode::UNAUTHORIZED,
        code: "MISSING_TOKEN",
        message: "No authentication token provided",
    })
}
