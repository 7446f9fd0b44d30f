//! Pluggable policies mapping claims to allowed routes and a principal

use crate::decoder::Claims;

/// Claim the pool uses for the account's username
pub const USERNAME_CLAIM: &str = "cognito:username";

/// Policy deciding which routes a caller with the given claims may access
pub trait RouteSelector: Send + Sync {
    fn allowed_routes(&self, claims: &Claims) -> Vec<String>;
}

/// Policy assigning a principal identifier to the caller
pub trait PrincipalSelector: Send + Sync {
    fn principal(&self, claims: &Claims) -> Option<String>;
}

/// Grants access to every route
#[derive(Debug, Clone, Copy, Default)]
pub struct AllRoutes;

impl RouteSelector for AllRoutes {
    fn allowed_routes(&self, _claims: &Claims) -> Vec<String> {
        vec!["*".to_string()]
    }
}

/// Uses the pool's username claim as the principal
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameSelector;

impl PrincipalSelector for UsernameSelector {
    fn principal(&self, claims: &Claims) -> Option<String> {
        claims.get_str(USERNAME_CLAIM).map(String::from)
    }
}
