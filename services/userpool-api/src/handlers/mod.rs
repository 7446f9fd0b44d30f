//! HTTP request handlers

mod account;
mod health;

pub use account::{auth_challenge, confirm_registration, login, refresh, register, whoami};
pub use health::health;
