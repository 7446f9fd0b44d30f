//! Shared test fixtures

mod jwks_mock;

pub use jwks_mock::*;
