//! Shared handler state.

use crate::config::ApiConfig;
use cadenza_controller::ModelController;
use std::sync::Arc;

/// State handed to every route; cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub controller: ModelController,
    pub config: Arc<ApiConfig>,
}

impl ApiState {
    pub fn new(controller: ModelController, config: ApiConfig) -> Self {
        Self {
            controller,
            config: Arc::new(config),
        }
    }
}
