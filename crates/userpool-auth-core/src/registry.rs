//! Named authorizer registry for dispatch-table wiring

use std::collections::HashMap;
use std::sync::Arc;

use crate::authorizer::UserPoolAuthorizer;

/// Registry error
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Authorizer names must be unique within a registry
    #[error("duplicate authorizer name {0}")]
    DuplicateName(String),
}

/// Dispatch table of named authorizers.
///
/// Handlers register an authorizer under a name at construction time and
/// look it up per request. Registering the same name twice is a
/// construction-time error rather than a silent overwrite.
#[derive(Debug, Default)]
pub struct AuthorizerRegistry {
    authorizers: HashMap<String, Arc<UserPoolAuthorizer>>,
}

impl AuthorizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authorizer under a unique name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        authorizer: Arc<UserPoolAuthorizer>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.authorizers.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.authorizers.insert(name, authorizer);
        Ok(())
    }

    /// Look up an authorizer by name
    pub fn get(&self, name: &str) -> Option<&Arc<UserPoolAuthorizer>> {
        self.authorizers.get(name)
    }
}
