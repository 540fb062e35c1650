//! Model catalog endpoints.

use crate::state::ApiState;
use axum::extract::State;
use axum::Json;
use cadenza_registry::ModelListing;
use serde::{Deserialize, Serialize};

/// `POST /model_info` - ordinal-indexed metadata of every installed model.
pub async fn model_info(State(state): State<ApiState>) -> Json<ModelListing> {
    Json(state.controller.list_models())
}

/// One model folder the registry scan skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogErrorView {
    pub folder: String,
    pub reason: String,
}

/// `GET /v1/models/errors` - folders skipped while scanning the model root.
pub async fn catalog_errors(State(state): State<ApiState>) -> Json<Vec<CatalogErrorView>> {
    let errors = state
        .controller
        .catalog_errors()
        .iter()
        .map(|e| CatalogErrorView {
            folder: e.folder.display().to_string(),
            reason: e.reason.to_string(),
        })
        .collect();
    Json(errors)
}
