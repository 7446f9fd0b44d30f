//! Application state

use std::sync::Arc;

use userpool_auth_core::{
    AuthorizerRegistry, CognitoLifecycle, KeyFetcher, RegistryError, TokenDecoder,
    UserPoolAuthorizer,
};

use crate::config::Config;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<AuthorizerRegistry>,
    pub lifecycle: Arc<CognitoLifecycle>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the authorizer and lifecycle adapter from configuration
    pub fn new(config: Config) -> Result<Self, RegistryError> {
        let auth = &config.auth;

        let decoder = TokenDecoder::new(KeyFetcher::new(auth), auth.client_id.clone());
        let authorizer = Arc::new(UserPoolAuthorizer::new(decoder));

        let mut registry = AuthorizerRegistry::new();
        registry.register(auth.authorizer_name.clone(), authorizer)?;

        let lifecycle = Arc::new(CognitoLifecycle::new(auth));

        Ok(Self {
            registry: Arc::new(registry),
            lifecycle,
            config: Arc::new(config),
        })
    }
}
