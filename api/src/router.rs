//! Router configuration and setup.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{routes, state::ApiState};

/// Build the application router with middleware.
///
/// Uploads are bounded by `max_upload_bytes`; axum's own body limit is
/// replaced by the tower-http one so both extractors see the same cap.
pub fn build_router(state: ApiState) -> Router {
    let max_body = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/model_info", post(routes::models::model_info))
        .route("/v1/models/errors", get(routes::models::catalog_errors))
        .route("/generate", post(routes::generate::generate))
        .route("/pre_train_generate", post(routes::generate::pre_train_generate))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
