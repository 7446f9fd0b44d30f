//! User pool auth API
//!
//! HTTP service exposing user pool account lifecycle routes and a
//! token-protected identity endpoint.

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting user pool auth API");

    let config = Config::from_env()?;
    let http_port = config.http_port;
    let state = AppState::new(config)?;

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/confirm_registration", post(handlers::confirm_registration))
        .route("/login", post(handlers::login))
        .route("/auth_challenge", post(handlers::auth_challenge))
        .route("/refresh", post(handlers::refresh))
        .route("/whoami", get(handlers::whoami))
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
