//! Cadenza API Crate
//!
//! HTTP layer for the generation server, built on Axum.
//!
//! # Architecture
//!
//! - `GET /health`, `POST /model_info`, `GET /v1/models/errors`
//! - `POST /generate` and `POST /pre_train_generate` (multipart uploads)
//! - RFC 7807 problem-details errors, request tracing, body size limit
//!
//! # Usage
//!
//! ```rust,no_run
//! use cadenza_api::{run_server, ApiConfig, ApiState};
//! use cadenza_controller::ModelController;
//! use cadenza_pipeline::ReplayBackend;
//! use cadenza_registry::ModelRegistry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(ModelRegistry::scan("data/models"));
//!     let controller = ModelController::with_defaults(registry, Arc::new(ReplayBackend::new()));
//!     run_server(ApiState::new(controller, ApiConfig::default())).await
//! }
//! ```

#![deny(unsafe_code)]

mod config;
mod error;
mod router;
pub mod routes;
mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ProblemDetails};
pub use router::build_router;
pub use routes::generate::ALLOWED_MIDI_TYPES;
pub use state::ApiState;

/// Run the HTTP API server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server(state: ApiState) -> anyhow::Result<()> {
    let addr = state.config.bind;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Cadenza API server listening on http://{}", listener.local_addr()?);

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
