//! Authorization decisions from bearer tokens

use crate::decoder::TokenDecoder;
use crate::selector::{AllRoutes, PrincipalSelector, RouteSelector, UsernameSelector};
use crate::AuthError;

/// Inbound authorization request carrying the bearer token
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub token: String,
}

impl AuthRequest {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Outcome of an authorization check: the routes the caller may access and
/// the principal assigned to them. Empty routes with no principal is a deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub routes: Vec<String>,
    pub principal_id: Option<String>,
}

impl AuthDecision {
    /// The deny decision: no routes, no principal
    pub fn deny() -> Self {
        Self {
            routes: Vec::new(),
            principal_id: None,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Entry point invoked by the hosting framework's authorization hook.
///
/// A rejected token is a normal outcome, not an error: it produces a deny
/// decision. Only faults unrelated to the token itself (a JWKS fetch
/// failure, for instance) surface as `Err`, so the caller fails closed by
/// erroring rather than by silently allowing.
pub struct UserPoolAuthorizer {
    decoder: TokenDecoder,
    route_selector: Box<dyn RouteSelector>,
    principal_selector: Box<dyn PrincipalSelector>,
}

impl UserPoolAuthorizer {
    /// Create an authorizer with the default selectors (all routes allowed,
    /// principal from the pool's username claim)
    pub fn new(decoder: TokenDecoder) -> Self {
        Self::with_selectors(decoder, Box::new(AllRoutes), Box::new(UsernameSelector))
    }

    /// Create an authorizer with custom selector policies
    pub fn with_selectors(
        decoder: TokenDecoder,
        route_selector: Box<dyn RouteSelector>,
        principal_selector: Box<dyn PrincipalSelector>,
    ) -> Self {
        Self {
            decoder,
            route_selector,
            principal_selector,
        }
    }

    /// Verify the request's token and produce an authorization decision
    pub async fn authorize(&self, request: &AuthRequest) -> Result<AuthDecision, AuthError> {
        match self.decoder.decode(&request.token).await {
            Ok(claims) => Ok(AuthDecision {
                routes: self.route_selector.allowed_routes(&claims),
                principal_id: self.principal_selector.principal(&claims),
            }),
            Err(AuthError::InvalidToken(reason)) => {
                tracing::debug!(%reason, "Token rejected, denying request");
                Ok(AuthDecision::deny())
            }
            Err(other) => Err(other),
        }
    }
}

impl std::fmt::Debug for UserPoolAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPoolAuthorizer")
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}
