//! JWKS fetching with a fetch-once key cache

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::{AuthConfig, AuthError};

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

/// Fetches the user pool's signing keys and caches them for the life of the
/// instance.
///
/// The cache is populated at most once: the first `get_keys` call performs
/// the network fetch, every later call returns the cached set without I/O.
/// There is no TTL and no invalidation; a key rotation requires a new
/// instance. Fetch errors are not cached, so a failed first call is retried
/// on the next one.
pub struct KeyFetcher {
    jwks_url: String,
    http_client: reqwest::Client,
    keys: OnceCell<Arc<Vec<Jwk>>>,
}

impl KeyFetcher {
    /// Create a new key fetcher
    pub fn new(config: &AuthConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(config, http_client)
    }

    /// Create a key fetcher with a custom HTTP client
    pub fn with_client(config: &AuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            jwks_url: config.jwks_url(),
            http_client,
            keys: OnceCell::new(),
        }
    }

    /// Get the signing key set, fetching it on first use
    pub async fn get_keys(&self) -> Result<Arc<Vec<Jwk>>, AuthError> {
        self.keys
            .get_or_try_init(|| async {
                let jwks = self.fetch_jwks().await?;
                Ok(Arc::new(jwks.keys))
            })
            .await
            .cloned()
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch JWKS");
                AuthError::KeyFetch(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "JWKS fetch returned error status");
            return Err(AuthError::KeyFetch(format!(
                "JWKS endpoint returned HTTP {}",
                response.status()
            )));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS");
            AuthError::KeyFetch(format!("invalid JWKS body: {e}"))
        })
    }
}

impl std::fmt::Debug for KeyFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFetcher")
            .field("jwks_url", &self.jwks_url)
            .field("cached", &self.keys.initialized())
            .finish_non_exhaustive()
    }
}
