//! File-layout constants for model installations.
//!
//! The typed view lives in [`crate::descriptor`].

// ============================================================================
// Model folder layout
// ============================================================================

/// Per-model metadata file scanned by the registry.
pub const METADATA_FILE: &str = "data.json";

/// Model hyper-parameter file read by the load stage.
pub const CONFIG_FILE: &str = "config.json";

/// Model weights file read by the load stage.
pub const WEIGHTS_FILE: &str = "model.pth";

// ============================================================================
// Metadata keys
// ============================================================================

/// Required key holding the unique model name.
pub const KEY_MODEL_NAME: &str = "model_name";

/// Key holding the kind discriminator (string or `{ "model": "<tag>" }`).
pub const KEY_TAG: &str = "tag";

/// Key added to every listing entry with the absolute model folder.
pub const KEY_MODEL_FOLDER_PATH: &str = "model_folder_path";

// ============================================================================
// Kind tags
// ============================================================================

/// Unconditional (pre-trained) generation models.
pub const TAG_PRETRAINED: &str = "pretrained";

/// Task-tuned (supervised fine-tuned) models.
pub const TAG_SFT: &str = "sft";
