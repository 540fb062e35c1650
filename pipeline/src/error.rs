/// Pipeline errors
///
/// Represents all possible failure modes for pipeline selection and the
/// load / preprocess / generate / postprocess stages.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No suitable pipeline for model '{model}'")]
    NoSuitablePipeline { model: String },

    #[error("Model '{model}' declares unsupported kind tag '{tag}'")]
    UnsupportedKindTag { model: String, tag: String },

    #[error("Model load failed: {0}")]
    Load(String),

    #[error("Preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Postprocessing failed: {0}")]
    Postprocess(String),

    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error reported by an inference backend.
///
/// Backends are opaque; the pipeline turns this into the error of whichever
/// stage called it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<midly::Error> for BackendError {
    fn from(e: midly::Error) -> Self {
        Self(format!("invalid MIDI data: {}", e))
    }
}
