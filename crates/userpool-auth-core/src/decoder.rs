//! Bearer token verification against the user pool's signing keys

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keys::{Jwk, KeyFetcher};
use crate::AuthError;

/// Claims decoded from a verified token.
///
/// `exp` and `aud` are mandatory; everything else the pool puts in the
/// payload (username, groups, custom attributes) lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
    /// Audience, must equal the configured app client ID. The pool always
    /// issues a single string audience; an array-valued `aud` is rejected
    /// at deserialization as a decode failure.
    pub aud: String,
    /// Remaining pool-specific claims
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Look up an additional claim by name
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }

    /// Look up an additional string claim by name
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(|v| v.as_str())
    }
}

/// Source of "now" for expiry checks, injectable so tests can pin time
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock pinned to a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

/// Verifies a compact token's signature, expiry, and audience.
///
/// Checks run in a fixed order: signature first (never trust an untampered
/// payload claim before the signature holds), then expiry, then audience.
/// The order determines which error a token failing several checks reports.
pub struct TokenDecoder {
    key_fetcher: KeyFetcher,
    client_id: String,
    clock: Arc<dyn Clock>,
}

impl TokenDecoder {
    /// Create a decoder using the wall clock
    pub fn new(key_fetcher: KeyFetcher, client_id: impl Into<String>) -> Self {
        Self::with_clock(key_fetcher, client_id, Arc::new(SystemClock))
    }

    /// Create a decoder with an injected clock
    pub fn with_clock(
        key_fetcher: KeyFetcher,
        client_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            key_fetcher,
            client_id: client_id.into(),
            clock,
        }
    }

    /// Verify a token and return its claims.
    ///
    /// Every call re-verifies; decoded claims are never cached. Key-fetch
    /// transport faults propagate as [`AuthError::KeyFetch`], all
    /// verification failures as [`AuthError::InvalidToken`].
    pub async fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode token header");
            AuthError::invalid_token("Error decoding token")
        })?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_token("Error decoding token"))?;

        let keys = self.key_fetcher.get_keys().await?;
        let jwk = keys.iter().find(|k| k.kid == kid).ok_or_else(|| {
            tracing::debug!(%kid, "Key not found in JWKS");
            AuthError::invalid_token(format!("Could not find kid {kid}"))
        })?;

        let claims = self.verify_signature(token, jwk)?;

        if self.clock.now_secs() > claims.exp {
            return Err(AuthError::invalid_token("Token expired"));
        }

        if claims.aud != self.client_id {
            return Err(AuthError::invalid_token(
                "Token was not issued for this audience",
            ));
        }

        Ok(claims)
    }

    /// Verify the signature under the matched key and deserialize the payload
    fn verify_signature(&self, token: &str, jwk: &Jwk) -> Result<Claims, AuthError> {
        // Algorithm comes from the key material, not the token header
        let algorithm = match jwk.alg.as_deref() {
            Some(alg) => alg
                .parse::<Algorithm>()
                .map_err(|_| AuthError::invalid_token("Error decoding token"))?,
            None => Algorithm::RS256,
        };

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            tracing::debug!(error = %e, kid = %jwk.kid, "Failed to construct decoding key");
            AuthError::invalid_token("Error decoding token")
        })?;

        // Expiry and audience are checked manually after signature
        // verification so the failure order is deterministic.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::invalid_token("Signature verification failed")
                }
                _ => {
                    tracing::debug!(error = %e, "Token decode failed");
                    AuthError::invalid_token("Error decoding token")
                }
            })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDecoder")
            .field("key_fetcher", &self.key_fetcher)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_extra_lookup() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "exp": 3600,
            "aud": "client_id",
            "cognito:username": "john",
            "custom:role": 7,
        }))
        .unwrap();

        assert_eq!(claims.exp, 3600);
        assert_eq!(claims.aud, "client_id");
        assert_eq!(claims.get_str("cognito:username"), Some("john"));
        assert_eq!(claims.get("custom:role"), Some(&serde_json::json!(7)));
        assert_eq!(claims.get_str("missing"), None);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(0).now_secs(), 0);
        assert!(SystemClock.now_secs() > 1_600_000_000);
    }
}
