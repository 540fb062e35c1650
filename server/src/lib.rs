//! Cadenza Server Binary
//!
//! Wires the crates together: loads [`ServerConfig`], scans the model
//! registry, builds the [`ModelController`] and serves the HTTP API from
//! `cadenza-api`. Request handling lives in the controller, not here.

pub mod config;

pub use config::{CliArgs, ServerConfig};

use cadenza_api::ApiState;
use cadenza_controller::ModelController;
use cadenza_pipeline::{InferenceBackend, PipelineFactory, ReplayBackend};
use cadenza_registry::ModelRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Scan the registry and build the shared API state.
///
/// Runs the catalog scan synchronously; call it before the runtime starts
/// serving requests.
pub fn build_state(config: &ServerConfig, backend: Arc<dyn InferenceBackend>) -> ApiState {
    let registry = Arc::new(ModelRegistry::scan(&config.models_root));
    info!(
        root = %config.models_root.display(),
        models = registry.len(),
        skipped = registry.catalog_errors().len(),
        "Model catalog loaded"
    );
    if registry.is_empty() {
        warn!(root = %config.models_root.display(), "No models installed; every generation request will be rejected");
    }

    let controller = ModelController::new(
        registry,
        PipelineFactory::with_default_registrations(),
        backend,
        config.controller_config(),
    );
    ApiState::new(controller, config.api_config())
}

/// Build state with the bundled backend and serve until Ctrl-C.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config, Arc::new(ReplayBackend::new()));
    cadenza_api::run_server(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_state_scans_models_root() {
        let models = TempDir::new().unwrap();
        let folder = models.path().join("base");
        fs::create_dir(&folder).unwrap();
        fs::write(
            folder.join("data.json"),
            json!({"model_name": "MORTM4.1-SAX", "tag": "pretrained"}).to_string(),
        )
        .unwrap();

        let config = ServerConfig {
            models_root: models.path().to_path_buf(),
            max_concurrent_generations: 3,
            ..Default::default()
        };
        let state = build_state(&config, Arc::new(ReplayBackend::new()));

        assert!(state.controller.has_model("MORTM4.1-SAX"));
        assert_eq!(state.controller.list_models().len(), 1);
        assert_eq!(state.config.bind.port(), 8000);
    }

    #[test]
    fn test_build_state_with_missing_root() {
        let config = ServerConfig {
            models_root: "does/not/exist".into(),
            ..Default::default()
        };
        let state = build_state(&config, Arc::new(ReplayBackend::new()));
        assert!(state.controller.list_models().is_empty());
    }
}
