/// Controller errors
///
/// One variant per failure point of a generation request. Every variant
/// names the model it was serving so transport layers can report it.
use crate::stage::Stage;
use cadenza_pipeline::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Model '{model}' is not registered")]
    UnknownModel { model: String },

    #[error("No pipeline can serve model '{model}': {message}")]
    PipelineSelection { model: String, message: String },

    #[error("Failed to load model '{model}': {message}")]
    ModelLoad { model: String, message: String },

    #[error("Preprocessing failed for '{model}': {message}")]
    Preprocess { model: String, message: String },

    #[error("Generation failed for '{model}': {message}")]
    Generation { model: String, message: String },

    #[error("Postprocessing failed for '{model}': {message}")]
    Postprocess { model: String, message: String },

    #[error("Invalid request for '{model}': {message}")]
    InvalidRequest { model: String, message: String },

    #[error("Generation worker for '{model}' failed: {message}")]
    Worker { model: String, message: String },
}

impl ControllerError {
    /// Attribute a pipeline failure to the stage that was running.
    pub fn from_pipeline(model: &str, stage: Stage, err: PipelineError) -> Self {
        let model = model.to_string();
        let message = err.to_string();
        match err {
            PipelineError::NoSuitablePipeline { .. } => Self::PipelineSelection { model, message },
            PipelineError::UnsupportedKindTag { .. } => Self::ModelLoad { model, message },
            PipelineError::InvalidRequest { .. } => Self::InvalidRequest { model, message },
            _ => match stage {
                Stage::Validating => Self::InvalidRequest { model, message },
                Stage::Loading => Self::ModelLoad { model, message },
                Stage::Preprocessing => Self::Preprocess { model, message },
                Stage::Generating => Self::Generation { model, message },
                Stage::Postprocessing | Stage::Done | Stage::Failed => Self::Postprocess { model, message },
            },
        }
    }

    /// Stable error kind name for responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownModel { .. } => "UnknownModelError",
            Self::PipelineSelection { .. } => "PipelineSelectionError",
            Self::ModelLoad { .. } => "ModelLoadError",
            Self::Preprocess { .. } => "PreprocessError",
            Self::Generation { .. } => "GenerationError",
            Self::Postprocess { .. } => "PostprocessError",
            Self::InvalidRequest { .. } => "InvalidRequestError",
            Self::Worker { .. } => "WorkerError",
        }
    }

    /// Stage the request failed in; `None` when the worker itself failed.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::UnknownModel { .. } | Self::InvalidRequest { .. } => Some(Stage::Validating),
            Self::PipelineSelection { .. } | Self::ModelLoad { .. } => Some(Stage::Loading),
            Self::Preprocess { .. } => Some(Stage::Preprocessing),
            Self::Generation { .. } => Some(Stage::Generating),
            Self::Postprocess { .. } => Some(Stage::Postprocessing),
            Self::Worker { .. } => None,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::UnknownModel { model }
            | Self::PipelineSelection { model, .. }
            | Self::ModelLoad { model, .. }
            | Self::Preprocess { model, .. }
            | Self::Generation { model, .. }
            | Self::Postprocess { model, .. }
            | Self::InvalidRequest { model, .. }
            | Self::Worker { model, .. } => model,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        let err = ControllerError::from_pipeline("m", Stage::Generating, PipelineError::Generation("boom".into()));
        assert_eq!(err.kind(), "GenerationError");
        assert_eq!(err.stage(), Some(Stage::Generating));

        let err = ControllerError::from_pipeline("m", Stage::Loading, PipelineError::Load("no weights".into()));
        assert_eq!(err.kind(), "ModelLoadError");

        let err = ControllerError::from_pipeline(
            "m",
            Stage::Loading,
            PipelineError::NoSuitablePipeline { model: "m".into() },
        );
        assert_eq!(err.kind(), "PipelineSelectionError");
        assert_eq!(err.model(), "m");
    }

    #[test]
    fn test_invalid_request_wins_over_stage() {
        let err = ControllerError::from_pipeline(
            "m",
            Stage::Preprocessing,
            PipelineError::InvalidRequest {
                field: "chord_times",
                reason: "length mismatch".into(),
            },
        );
        assert_eq!(err.kind(), "InvalidRequestError");
    }
}
