//! Integration tests for JWKS-backed token verification and authorization
//!
//! A wiremock server stands in for the user pool's JWKS endpoint; tokens are
//! signed with a pre-generated RSA test keypair.

mod common;

use std::sync::Arc;

use userpool_auth_core::{
    AuthConfig, AuthError, AuthRequest, Claims, FixedClock, KeyFetcher, PrincipalSelector,
    RouteSelector, TokenDecoder, UserPoolAuthorizer,
};

use common::{JwksMockServer, TestClaims, TestKeyPair, TEST_KEY_ID};

const TEST_CLIENT_ID: &str = "client_id";
const TEST_POOL_ID: &str = "us-east-1_TestPool";
const TEST_REGION: &str = "us-east-1";

/// Create an AuthConfig pointing at the mock server
fn create_test_config(mock_url: &str) -> AuthConfig {
    AuthConfig::new(TEST_POOL_ID, TEST_REGION, TEST_CLIENT_ID)
        .with_jwks_url_override(format!("{mock_url}/.well-known/jwks.json"))
}

/// Decoder with the clock pinned to the epoch, so `exp: 3600` is in the future
fn decoder_at_epoch(config: &AuthConfig) -> TokenDecoder {
    TokenDecoder::with_clock(
        KeyFetcher::new(config),
        TEST_CLIENT_ID,
        Arc::new(FixedClock(0)),
    )
}

fn assert_invalid_token(result: Result<Claims, AuthError>, expected_reason: &str) {
    match result {
        Err(AuthError::InvalidToken(reason)) => assert_eq!(reason, expected_reason),
        other => panic!("Expected InvalidToken({expected_reason:?}), got: {other:?}"),
    }
}

#[tokio::test]
async fn test_valid_token_decodes_claims() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600).with("name", "john");
    let token = TestKeyPair::load().sign(&claims);

    let decoded = decoder.decode(&token).await.expect("token should verify");
    assert_eq!(decoded.get_str("name"), Some("john"));
    assert_eq!(decoded.aud, TEST_CLIENT_ID);
    assert_eq!(decoded.exp, 3600);
}

#[tokio::test]
async fn test_unknown_kid_fails_with_kid_message() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign_with_kid(&claims, "missing-key");

    assert_invalid_token(
        decoder.decode(&token).await,
        "Could not find kid missing-key",
    );
}

#[tokio::test]
async fn test_empty_key_set_fails_with_kid_message() {
    let mock_server = JwksMockServer::start_bare().await;
    mock_server.with_keys(vec![]).await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign(&claims);

    assert_invalid_token(
        decoder.decode(&token).await,
        &format!("Could not find kid {TEST_KEY_ID}"),
    );
}

#[tokio::test]
async fn test_signature_mismatch_fails() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    // Well-formed claims signed by a key the JWKS does not publish
    let claims = TestClaims::new(TEST_CLIENT_ID, 3600).with("name", "john");
    let token = TestKeyPair::mismatched().sign(&claims);

    assert_invalid_token(decoder.decode(&token).await, "Signature verification failed");
}

#[tokio::test]
async fn test_signature_checked_before_expiry() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());

    // Clock far past exp; the bad signature must still win
    let decoder = TokenDecoder::with_clock(
        KeyFetcher::new(&config),
        TEST_CLIENT_ID,
        Arc::new(FixedClock(1_000_000)),
    );

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::mismatched().sign(&claims);

    assert_invalid_token(decoder.decode(&token).await, "Signature verification failed");
}

#[tokio::test]
async fn test_expired_token_fails() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());

    // Default wall clock is decades past an exp of 3600 seconds after epoch
    let decoder = TokenDecoder::new(KeyFetcher::new(&config), TEST_CLIENT_ID);

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600).with("name", "john");
    let token = TestKeyPair::load().sign(&claims);

    assert_invalid_token(decoder.decode(&token).await, "Token expired");
}

#[tokio::test]
async fn test_expiry_checked_before_audience() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());

    // Both checks would fail; expiry comes first
    let decoder = TokenDecoder::new(KeyFetcher::new(&config), "wrong_id");

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign(&claims);

    assert_invalid_token(decoder.decode(&token).await, "Token expired");
}

#[tokio::test]
async fn test_wrong_audience_fails() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = TokenDecoder::with_clock(
        KeyFetcher::new(&config),
        "wrong_id",
        Arc::new(FixedClock(0)),
    );

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign(&claims);

    assert_invalid_token(
        decoder.decode(&token).await,
        "Token was not issued for this audience",
    );
}

#[tokio::test]
async fn test_malformed_tokens_fail_with_generic_message() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    let malformed_tokens = ["", "not-a-jwt", "one.two", "one.two.three.four"];

    for token in malformed_tokens {
        assert_invalid_token(decoder.decode(token).await, "Error decoding token");
    }
}

#[tokio::test]
async fn test_token_without_kid_fails_with_generic_message() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    // Signed without a kid header; the kid check fails before any key lookup
    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
    let key = jsonwebtoken::EncodingKey::from_secret(b"unused");
    let token = jsonwebtoken::encode(
        &header,
        TestClaims::new(TEST_CLIENT_ID, 3600).json(),
        &key,
    )
    .unwrap();

    assert_invalid_token(decoder.decode(&token).await, "Error decoding token");
}

#[tokio::test]
async fn test_jwks_fetched_exactly_once() {
    let mock_server = JwksMockServer::start_bare().await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    // The guard panics on drop unless the endpoint was hit exactly once
    let _guard = mock_server.expect_jwks_calls(1).await;

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign(&claims);

    for _ in 0..5 {
        decoder.decode(&token).await.expect("token should verify");
    }
}

#[tokio::test]
async fn test_get_keys_returns_identical_cached_set() {
    let mock_server = JwksMockServer::start_bare().await;
    let config = create_test_config(&mock_server.url());
    let fetcher = KeyFetcher::new(&config);

    let _guard = mock_server.expect_jwks_calls(1).await;

    let first = fetcher.get_keys().await.expect("fetch should succeed");
    for _ in 0..4 {
        let again = fetcher.get_keys().await.expect("cache hit should succeed");
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_jwks_fetch_error_is_not_invalid_token() {
    let mock_server = JwksMockServer::start_bare().await;
    mock_server.with_error_response(500).await;
    let config = create_test_config(&mock_server.url());
    let decoder = decoder_at_epoch(&config);

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600);
    let token = TestKeyPair::load().sign(&claims);

    match decoder.decode(&token).await {
        Err(AuthError::KeyFetch(_)) => {}
        other => panic!("Expected KeyFetch error, got: {other:?}"),
    }
}

// ============================================================================
// Authorizer
// ============================================================================

#[tokio::test]
async fn test_authorizer_allows_valid_token_with_default_selectors() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let authorizer = UserPoolAuthorizer::new(decoder_at_epoch(&config));

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600).with("cognito:username", "john");
    let token = TestKeyPair::load().sign(&claims);

    let decision = authorizer
        .authorize(&AuthRequest::new(token))
        .await
        .expect("authorize should not error");

    assert!(!decision.is_denied());
    assert_eq!(decision.routes, vec!["*".to_string()]);
    assert_eq!(decision.principal_id, Some("john".to_string()));
}

#[tokio::test]
async fn test_authorizer_denies_invalid_token_without_error() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let authorizer = UserPoolAuthorizer::new(decoder_at_epoch(&config));

    // Expired, garbage, and unknown-kid tokens all deny rather than error
    let expired = TestKeyPair::load().sign(&TestClaims::new(TEST_CLIENT_ID, -1));
    let unknown_kid =
        TestKeyPair::load().sign_with_kid(&TestClaims::new(TEST_CLIENT_ID, 3600), "nope");

    for token in [expired.as_str(), unknown_kid.as_str(), "garbage"] {
        let decision = authorizer
            .authorize(&AuthRequest::new(token))
            .await
            .expect("bad tokens must deny, not error");

        assert!(decision.is_denied());
        assert!(decision.routes.is_empty());
        assert_eq!(decision.principal_id, None);
    }
}

#[tokio::test]
async fn test_authorizer_propagates_key_fetch_failure() {
    let mock_server = JwksMockServer::start_bare().await;
    mock_server.with_error_response(503).await;
    let config = create_test_config(&mock_server.url());
    let authorizer = UserPoolAuthorizer::new(decoder_at_epoch(&config));

    let token = TestKeyPair::load().sign(&TestClaims::new(TEST_CLIENT_ID, 3600));

    // Infrastructure faults must not turn into a quiet deny
    let result = authorizer.authorize(&AuthRequest::new(token)).await;
    assert!(matches!(result, Err(AuthError::KeyFetch(_))));
}

/// Restricts routes to the token's `scope` claim
struct ScopeRoutes;

impl RouteSelector for ScopeRoutes {
    fn allowed_routes(&self, claims: &Claims) -> Vec<String> {
        claims
            .get_str("scope")
            .map(|s| s.split(' ').map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Uses the email claim as the principal
struct EmailPrincipal;

impl PrincipalSelector for EmailPrincipal {
    fn principal(&self, claims: &Claims) -> Option<String> {
        claims.get_str("email").map(String::from)
    }
}

#[tokio::test]
async fn test_authorizer_with_injected_selectors() {
    let mock_server = JwksMockServer::start().await;
    let config = create_test_config(&mock_server.url());
    let authorizer = UserPoolAuthorizer::with_selectors(
        decoder_at_epoch(&config),
        Box::new(ScopeRoutes),
        Box::new(EmailPrincipal),
    );

    let claims = TestClaims::new(TEST_CLIENT_ID, 3600)
        .with("scope", "/reports /admin")
        .with("email", "john@example.com");
    let token = TestKeyPair::load().sign(&claims);

    let decision = authorizer
        .authorize(&AuthRequest::new(token))
        .await
        .expect("authorize should not error");

    assert_eq!(
        decision.routes,
        vec!["/reports".to_string(), "/admin".to_string()]
    );
    assert_eq!(
        decision.principal_id,
        Some("john@example.com".to_string())
    );
}
