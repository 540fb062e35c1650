//! Model descriptors built from per-folder metadata.

use crate::constants::{KEY_MODEL_FOLDER_PATH, KEY_MODEL_NAME, KEY_TAG, TAG_PRETRAINED, TAG_SFT};
use crate::error::CatalogEntryReason;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Raw metadata object as read from `data.json`, plus `model_folder_path`.
pub type ModelMetadata = Map<String, Value>;

/// Kind discriminator declared by a model installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    /// Unconditional continuation of the uploaded performance.
    Pretrained,
    /// Task-tuned model that branches on the request task.
    Sft,
    /// A tag this build does not know how to serve.
    Other(String),
    /// The metadata carries no tag at all.
    Unspecified,
}

impl KindTag {
    /// Parse the `tag` metadata value.
    ///
    /// Accepts either `"pretrained"` or `{ "model": "pretrained", ... }`.
    pub fn from_metadata(value: Option<&Value>) -> Self {
        let raw = match value {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(obj)) => obj.get("model").and_then(Value::as_str),
            _ => None,
        };

        match raw {
            Some(TAG_PRETRAINED) => Self::Pretrained,
            Some(TAG_SFT) => Self::Sft,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pretrained => TAG_PRETRAINED,
            Self::Sft => TAG_SFT,
            Self::Other(s) => s,
            Self::Unspecified => "",
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "<unspecified>"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One discoverable model installation.
///
/// Created once by the registry scan and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    /// Unique catalog key (`model_name` in the metadata).
    pub name: String,

    /// Folder holding metadata, config and weights.
    pub folder_path: PathBuf,

    /// Kind discriminator (`tag`).
    pub kind_tag: KindTag,

    /// Every metadata field, passed through untouched, plus
    /// `model_folder_path`.
    pub metadata: ModelMetadata,
}

impl ModelDescriptor {
    /// Build a descriptor from a parsed metadata document.
    pub fn from_metadata(folder: &Path, value: Value) -> Result<Self, CatalogEntryReason> {
        let mut metadata = match value {
            Value::Object(map) => map,
            other => {
                return Err(CatalogEntryReason::Malformed(format!(
                    "expected a JSON object, found {}",
                    json_type_name(&other)
                )))
            }
        };

        let name = match metadata.get(KEY_MODEL_NAME).and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(CatalogEntryReason::MissingName),
        };

        let kind_tag = KindTag::from_metadata(metadata.get(KEY_TAG));

        metadata.insert(
            KEY_MODEL_FOLDER_PATH.to_string(),
            Value::String(folder.to_string_lossy().into_owned()),
        );

        Ok(Self {
            name,
            folder_path: folder.to_path_buf(),
            kind_tag,
            metadata,
        })
    }

    /// Path of a file inside the model folder.
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.folder_path.join(file_name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tag_from_string_and_object() {
        assert_eq!(KindTag::from_metadata(Some(&json!("pretrained"))), KindTag::Pretrained);
        assert_eq!(KindTag::from_metadata(Some(&json!({"model": "sft"}))), KindTag::Sft);
        assert_eq!(
            KindTag::from_metadata(Some(&json!({"model": "lora"}))),
            KindTag::Other("lora".to_string())
        );
        assert_eq!(KindTag::from_metadata(None), KindTag::Unspecified);
        assert_eq!(KindTag::from_metadata(Some(&json!(3))), KindTag::Unspecified);
    }

    #[test]
    fn test_descriptor_keeps_extra_fields() {
        let folder = Path::new("/models/modelA");
        let descriptor = ModelDescriptor::from_metadata(
            folder,
            json!({"model_name": "Fam-X", "tag": "pretrained", "vocab": 512}),
        )
        .expect("descriptor");

        assert_eq!(descriptor.name, "Fam-X");
        assert_eq!(descriptor.kind_tag, KindTag::Pretrained);
        assert_eq!(descriptor.metadata["vocab"], json!(512));
        assert_eq!(descriptor.metadata[KEY_MODEL_FOLDER_PATH], json!("/models/modelA"));
        assert_eq!(descriptor.file("config.json"), folder.join("config.json"));
    }

    #[test]
    fn test_descriptor_requires_name() {
        let err = ModelDescriptor::from_metadata(Path::new("/m"), json!({"tag": "sft"}))
            .unwrap_err();
        assert_eq!(err, CatalogEntryReason::MissingName);

        let err = ModelDescriptor::from_metadata(Path::new("/m"), json!(["not", "an", "object"]))
            .unwrap_err();
        assert!(matches!(err, CatalogEntryReason::Malformed(_)));
    }
}
