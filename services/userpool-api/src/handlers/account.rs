//! Account lifecycle handlers (register, confirm, login, challenge, refresh)

use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use userpool_auth_core::{AuthOutcome, ChallengeSignal, TokenBundle};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub principal_id: Option<String>,
    pub routes: Vec<String>,
}

/// Pull a required string parameter out of a free-form JSON body
fn get_param<'a>(body: &'a serde_json::Value, key: &str) -> Result<&'a str, ApiError> {
    body.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required parameter: {key}")))
}

/// Every body field beyond the credentials becomes a user attribute.
/// Attribute values must be strings; anything else is a client error rather
/// than a silently dropped field.
fn attribute_params(body: &serde_json::Value) -> Result<HashMap<String, String>, ApiError> {
    let mut attributes = HashMap::new();
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            if key == "username" || key == "password" {
                continue;
            }
            let value = value
                .as_str()
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid parameter: {key}")))?;
            attributes.insert(key.clone(), value.to_string());
        }
    }
    Ok(attributes)
}

/// Render an auth attempt as a response: tokens on success, or a 401 whose
/// `Challenge`/`Session` headers tell the client what to answer next.
fn auth_outcome_response(outcome: AuthOutcome) -> Result<Response, ApiError> {
    match outcome {
        AuthOutcome::Tokens(bundle) => Ok((StatusCode::OK, Json(bundle)).into_response()),
        AuthOutcome::Challenge(signal) => challenge_response(signal),
    }
}

fn challenge_response(signal: ChallengeSignal) -> Result<Response, ApiError> {
    let challenge = HeaderValue::from_str(&signal.challenge)
        .map_err(|_| ApiError::Internal("Challenge name is not a valid header value".into()))?;
    let session = HeaderValue::from_str(&signal.session)
        .map_err(|_| ApiError::Internal("Challenge session is not a valid header value".into()))?;

    let mut response = (StatusCode::UNAUTHORIZED, Json(signal.parameters)).into_response();
    response.headers_mut().insert("Challenge", challenge);
    response.headers_mut().insert("Session", session);
    Ok(response)
}

/// POST /register
///
/// Create a new account. Any string field in the body beyond the
/// credentials is forwarded as a user attribute.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let username = get_param(&body, "username")?;
    let password = get_param(&body, "password")?;
    let attributes = attribute_params(&body)?;

    let response = state
        .lifecycle
        .register(username, password, &attributes)
        .await?;
    Ok(Json(response))
}

/// POST /confirm_registration
pub async fn confirm_registration(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<StatusCode> {
    let username = get_param(&body, "username")?;
    let code = get_param(&body, "code")?;

    state.lifecycle.confirm(username, code).await?;
    Ok(StatusCode::OK)
}

/// POST /login
///
/// Authenticate with username and password. A pending challenge comes back
/// as a 401 carrying `Challenge` and `Session` headers with the challenge
/// parameters as the body.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Response> {
    let username = get_param(&body, "username")?;
    let password = get_param(&body, "password")?;

    let outcome = state.lifecycle.login(username, password).await?;
    auth_outcome_response(outcome)
}

/// POST /auth_challenge
///
/// Answer a pending authentication challenge. May itself produce a further
/// challenge.
pub async fn auth_challenge(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Response> {
    let challenge = get_param(&body, "challenge")?;
    let session = get_param(&body, "session")?;
    let params: HashMap<String, String> = body
        .get("params")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid parameter: params".to_string()))?
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: params".to_string()))?;

    let outcome = state
        .lifecycle
        .auth_challenge(challenge, session, &params)
        .await?;
    auth_outcome_response(outcome)
}

/// POST /refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<TokenBundle>> {
    let refresh_token = get_param(&body, "refresh_token")?;

    let bundle = state.lifecycle.refresh(refresh_token).await?;
    Ok(Json(bundle))
}

/// GET /whoami
///
/// Echo the authorization decision for the presented token
pub async fn whoami(auth_user: AuthUser) -> ApiResult<Json<WhoamiResponse>> {
    Ok(Json(WhoamiResponse {
        principal_id: auth_user.principal_id,
        routes: auth_user.routes,
    }))
}
