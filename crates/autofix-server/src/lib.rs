// SPDX-License-Identifier: Apache-2.0

//! Linear webhook receiver for Autofix.
//!
//! Accepts issue events on `POST /webhook`, keeps those carrying the
//! trigger label, resolves the target repository and runs the fix
//! pipeline. Every pipeline outcome is answered with 200 and a JSON summary.

mod error;
pub mod signature;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use autofix_core::{Pipeline, ReposConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub use error::{ApiError, ErrorBody};
pub use webhook::WebhookResponse;

/// Shared state of the webhook server.
pub struct AppState {
    /// Pipeline wired to real or fake services.
    pub pipeline: Pipeline,
    /// Repository resolution settings.
    pub repos: ReposConfig,
    /// Label that marks an issue for fixing.
    pub trigger_label: String,
    /// Signing secret; `None` skips verification.
    pub secret: Option<SecretString>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the router: `POST /webhook` and `GET /health`.
///
/// Other methods on `/webhook` get 405.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook::handle))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves the router on `host:port` until Ctrl+C.
pub async fn run_http(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    // IPv6 literals need brackets
    let addr: SocketAddr = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
    .parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Webhook server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        })
        .await?;

    Ok(())
}
