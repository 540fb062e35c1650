//! Pretrained pipeline: unconditional continuation of the upload.

use crate::backend::{ContinuationJob, InferenceBackend, LoadedModel, ModelFiles};
use crate::base::{check_source, finalize_performance, raw_output_path, GeneratedOutput, Pipeline, PreparedInput};
use crate::error::{PipelineError, Result};
use crate::request::GenerationRequest;
use crate::types::PipelineKind;
use cadenza_registry::ModelDescriptor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PretrainedPipeline {
    descriptor: Arc<ModelDescriptor>,
    model: Box<dyn LoadedModel>,
}

impl PretrainedPipeline {
    /// Load the model (blocking).
    pub fn load(descriptor: Arc<ModelDescriptor>, backend: &dyn InferenceBackend) -> Result<Self> {
        let files = ModelFiles::for_descriptor(&descriptor);
        let model = backend
            .load(&descriptor, &files)
            .map_err(|e| PipelineError::Load(format!("{}: {}", descriptor.name, e)))?;

        info!(model = %descriptor.name, backend = backend.name(), "Loaded pretrained model");
        Ok(Self { descriptor, model })
    }
}

impl Pipeline for PretrainedPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Pretrained
    }

    fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    fn preprocess(&self, source: &Path, request: &GenerationRequest) -> Result<PreparedInput> {
        check_source(source)?;
        Ok(PreparedInput {
            source: source.to_path_buf(),
            request: request.clone(),
            chord_prompt: None,
        })
    }

    fn generate(&mut self, input: PreparedInput, save_dir: &Path) -> Result<GeneratedOutput> {
        let raw_path = raw_output_path(save_dir, &input.source)?;
        let job = ContinuationJob {
            prompt: &input.source,
            programs: &input.request.program,
            sampling: input.request.sampling(),
            raw_output: &raw_path,
        };

        debug!(model = %self.descriptor.name, raw = %raw_path.display(), "Generating continuation");
        self.model
            .continue_performance(&job)
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        Ok(GeneratedOutput::Performance { raw_path })
    }

    fn postprocess(&self, save_dir: &Path, output: GeneratedOutput) -> Result<PathBuf> {
        match output {
            GeneratedOutput::Performance { raw_path } => finalize_performance(save_dir, &raw_path),
            GeneratedOutput::Transcript { .. } => Err(PipelineError::Postprocess(
                "pretrained models do not produce transcripts".to_string(),
            )),
        }
    }
}
