//! Success payload of a generation request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub status: String,
    pub model_type: String,
    pub save_directory: PathBuf,
    /// The single artifact this run produced
    pub output_file: PathBuf,
}

impl GenerationResult {
    pub fn success(model_type: impl Into<String>, save_directory: PathBuf, output_file: PathBuf) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            model_type: model_type.into(),
            save_directory,
            output_file,
        }
    }
}
