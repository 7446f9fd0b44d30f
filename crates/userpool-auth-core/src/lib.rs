//! User pool auth core
//!
//! Verifies identity tokens issued by a Cognito user pool and turns them
//! into authorization decisions, plus an adapter forwarding account
//! lifecycle calls (register, confirm, login, challenge, refresh) to the
//! pool's API.

pub mod authorizer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod keys;
pub mod lifecycle;
pub mod registry;
pub mod selector;

pub use authorizer::{AuthDecision, AuthRequest, UserPoolAuthorizer};
pub use config::{AuthConfig, ConfigError, DEFAULT_AUTHORIZER_NAME};
pub use decoder::{Claims, Clock, FixedClock, SystemClock, TokenDecoder};
pub use error::AuthError;
pub use keys::{Jwk, Jwks, KeyFetcher};
pub use lifecycle::{
    AuthOutcome, ChallengeSignal, CognitoLifecycle, ProviderError, TokenBundle,
};
pub use registry::{AuthorizerRegistry, RegistryError};
pub use selector::{
    AllRoutes, PrincipalSelector, RouteSelector, UsernameSelector, USERNAME_CLAIM,
};
