//! Account lifecycle adapter for the Cognito user pool API
//!
//! Forwards register/confirm/login/challenge/refresh calls to the identity
//! provider's `x-amz-json-1.1` endpoint and normalizes responses into a
//! token bundle or a challenge signal.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

use crate::AuthConfig;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Tokens issued by the provider. Each member is independently optional;
/// refresh responses, for example, omit the refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Authentication is incomplete: the client must answer this challenge
/// (a forced password change, MFA, and so on) before tokens are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSignal {
    pub challenge: String,
    pub session: String,
    pub parameters: HashMap<String, String>,
}

/// Outcome of an authentication attempt. A challenge is an expected result,
/// not an error, so it is a variant rather than an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Tokens(TokenBundle),
    Challenge(ChallengeSignal),
}

/// Provider errors. Kept apart from token-verification errors so a service
/// fault can never be mistaken for a bad token.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected the call (e.g. NotAuthorizedException)
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// The provider could not be reached
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The provider answered with a shape we cannot interpret
    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthAttemptResponse {
    challenge_name: Option<String>,
    session: Option<String>,
    #[serde(default)]
    challenge_parameters: HashMap<String, String>,
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

impl From<AuthenticationResult> for TokenBundle {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            token_type: result.token_type,
        }
    }
}

/// Error body the provider returns on non-2xx responses
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Adapter forwarding account lifecycle calls to the user pool API.
///
/// All five operations are unauthenticated provider calls keyed by the app
/// client ID, forwarded unmodified; the only added logic is normalizing the
/// response into [`TokenBundle`] / [`ChallengeSignal`].
#[derive(Clone)]
pub struct CognitoLifecycle {
    client_id: String,
    endpoint: String,
    http_client: Client,
}

impl CognitoLifecycle {
    /// Create a new lifecycle adapter
    pub fn new(config: &AuthConfig) -> Self {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(config, http_client)
    }

    /// Create a lifecycle adapter with a custom HTTP client
    pub fn with_client(config: &AuthConfig, http_client: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            endpoint: config.provider_endpoint(),
            http_client,
        }
    }

    /// Make a provider API call
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<T, ProviderError> {
        debug!(%operation, "Calling identity provider");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %operation, "Provider request failed");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            let parsed: ProviderErrorBody = serde_json::from_slice(&bytes).unwrap_or(
                ProviderErrorBody {
                    error_type: None,
                    message: None,
                },
            );
            // The __type field may carry a namespace prefix (ns#Code)
            let code = parsed
                .error_type
                .as_deref()
                .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
                .unwrap_or_else(|| format!("HTTP{}", status.as_u16()));
            let message = parsed.message.unwrap_or_default();
            error!(%code, %message, %operation, "Provider returned error");
            return Err(ProviderError::Api { code, message });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::Malformed(format!("invalid {operation} response: {e}")))
    }

    /// Register a new account. Free-form attributes become the pool's user
    /// attributes. Returns the provider response untouched.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<serde_json::Value, ProviderError> {
        let user_attributes: Vec<serde_json::Value> = attributes
            .iter()
            .map(|(name, value)| serde_json::json!({"Name": name, "Value": value}))
            .collect();

        self.call(
            "SignUp",
            serde_json::json!({
                "ClientId": self.client_id,
                "Username": username,
                "Password": password,
                "UserAttributes": user_attributes,
            }),
        )
        .await
    }

    /// Confirm a registration with the emailed/texted code
    pub async fn confirm(&self, username: &str, code: &str) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .call(
                "ConfirmSignUp",
                serde_json::json!({
                    "ClientId": self.client_id,
                    "Username": username,
                    "ConfirmationCode": code,
                }),
            )
            .await?;
        Ok(())
    }

    /// Authenticate with username and password
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, ProviderError> {
        let response: AuthAttemptResponse = self
            .call(
                "InitiateAuth",
                serde_json::json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "AuthParameters": {
                        "USERNAME": username,
                        "PASSWORD": password,
                    },
                    "ClientId": self.client_id,
                }),
            )
            .await?;

        Self::auth_outcome(response)
    }

    /// Answer a pending authentication challenge
    pub async fn auth_challenge(
        &self,
        challenge: &str,
        session: &str,
        params: &HashMap<String, String>,
    ) -> Result<AuthOutcome, ProviderError> {
        let response: AuthAttemptResponse = self
            .call(
                "RespondToAuthChallenge",
                serde_json::json!({
                    "ChallengeName": challenge,
                    "Session": session,
                    "ChallengeResponses": params,
                    "ClientId": self.client_id,
                }),
            )
            .await?;

        Self::auth_outcome(response)
    }

    /// Exchange a refresh token for fresh access/id tokens
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle, ProviderError> {
        let response: AuthAttemptResponse = self
            .call(
                "InitiateAuth",
                serde_json::json!({
                    "AuthFlow": "REFRESH_TOKEN_AUTH",
                    "AuthParameters": {
                        "REFRESH_TOKEN": refresh_token,
                    },
                    "ClientId": self.client_id,
                }),
            )
            .await?;

        let result = response.authentication_result.ok_or_else(|| {
            ProviderError::Malformed("refresh response missing AuthenticationResult".to_string())
        })?;
        Ok(result.into())
    }

    /// Turn a provider auth response into tokens or a challenge signal
    fn auth_outcome(response: AuthAttemptResponse) -> Result<AuthOutcome, ProviderError> {
        if let Some(challenge) = response.challenge_name {
            let session = response.session.ok_or_else(|| {
                ProviderError::Malformed("challenge response missing Session".to_string())
            })?;
            return Ok(AuthOutcome::Challenge(ChallengeSignal {
                challenge,
                session,
                parameters: response.challenge_parameters,
            }));
        }

        let result = response.authentication_result.ok_or_else(|| {
            ProviderError::Malformed(
                "response carried neither AuthenticationResult nor ChallengeName".to_string(),
            )
        })?;
        Ok(AuthOutcome::Tokens(result.into()))
    }
}

impl std::fmt::Debug for CognitoLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoLifecycle")
            .field("client_id", &self.client_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
