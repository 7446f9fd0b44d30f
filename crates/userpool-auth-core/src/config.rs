//! Configuration types for the user pool auth core

/// Default name under which the authorizer is registered
pub const DEFAULT_AUTHORIZER_NAME: &str = "UserPoolAuth";

/// User pool auth configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Cognito user pool ID (e.g., us-east-1_xxxxx)
    pub user_pool_id: String,
    /// AWS region (e.g., us-east-1)
    pub region: String,
    /// Cognito app client ID, checked against the token `aud` claim
    pub client_id: String,
    /// Name under which the authorizer is registered for dispatch
    pub authorizer_name: String,
    /// JWKS URL override (tests point this at a mock server)
    jwks_url_override: Option<String>,
    /// Provider endpoint override (tests point this at a mock server)
    provider_endpoint_override: Option<String>,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(
        user_pool_id: impl Into<String>,
        region: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            user_pool_id: user_pool_id.into(),
            region: region.into(),
            client_id: client_id.into(),
            authorizer_name: DEFAULT_AUTHORIZER_NAME.to_string(),
            jwks_url_override: None,
            provider_endpoint_override: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Required: `COGNITO_USER_POOL_ID`, `COGNITO_CLIENT_ID`, and
    /// `COGNITO_REGION` (or `AWS_REGION` as a fallback). Missing required
    /// variables are fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_pool_id = std::env::var("COGNITO_USER_POOL_ID")
            .map_err(|_| ConfigError::Missing("COGNITO_USER_POOL_ID"))?;

        let region = std::env::var("COGNITO_REGION")
            .or_else(|_| std::env::var("AWS_REGION"))
            .map_err(|_| ConfigError::Missing("COGNITO_REGION"))?;

        let client_id = std::env::var("COGNITO_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("COGNITO_CLIENT_ID"))?;

        let authorizer_name = std::env::var("USER_POOL_AUTHORIZER_NAME")
            .unwrap_or_else(|_| DEFAULT_AUTHORIZER_NAME.to_string());

        Ok(Self::new(user_pool_id, region, client_id).with_authorizer_name(authorizer_name))
    }

    /// Get the user pool issuer URL
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Get the JWKS URL
    pub fn jwks_url(&self) -> String {
        match &self.jwks_url_override {
            Some(url) => url.clone(),
            None => format!("{}/.well-known/jwks.json", self.issuer()),
        }
    }

    /// Get the identity provider endpoint
    pub fn provider_endpoint(&self) -> String {
        match &self.provider_endpoint_override {
            Some(url) => url.clone(),
            None => format!("https://cognito-idp.{}.amazonaws.com/", self.region),
        }
    }

    /// Set the authorizer name
    pub fn with_authorizer_name(mut self, name: impl Into<String>) -> Self {
        self.authorizer_name = name.into();
        self
    }

    /// Override the JWKS URL
    pub fn with_jwks_url_override(mut self, url: impl Into<String>) -> Self {
        self.jwks_url_override = Some(url.into());
        self
    }

    /// Override the provider endpoint
    pub fn with_provider_endpoint_override(mut self, url: impl Into<String>) -> Self {
        self.provider_endpoint_override = Some(url.into());
        self
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
