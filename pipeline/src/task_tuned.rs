//! Task-tuned (`sft`) pipeline.
//!
//! Builds a chord-conditioning prompt when the request carries a full chord
//! progression, and branches on the task at postprocess: `CHORD_GEM` yields a
//! text transcript, anything else a performance.

use crate::backend::{ChordEncoder, InferenceBackend, LoadedModel, ModelFiles, TaskJob, Vocabulary};
use crate::base::{check_source, finalize_performance, raw_output_path, GeneratedOutput, Pipeline, PreparedInput};
use crate::chords::Tonality;
use crate::error::{PipelineError, Result};
use crate::request::GenerationRequest;
use crate::types::{PipelineKind, Token, CHORD_OUTPUT_FILE, DEFAULT_TONAL_CENTER};
use cadenza_registry::ModelDescriptor;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TaskTunedPipeline {
    descriptor: Arc<ModelDescriptor>,
    model: Box<dyn LoadedModel>,
    encoder: Arc<dyn ChordEncoder>,
    vocabulary: Arc<dyn Vocabulary>,
    tonality: Tonality,
}

impl TaskTunedPipeline {
    /// Load the model (blocking).
    pub fn load(descriptor: Arc<ModelDescriptor>, backend: &dyn InferenceBackend) -> Result<Self> {
        let files = ModelFiles::for_descriptor(&descriptor);
        let model = backend
            .load(&descriptor, &files)
            .map_err(|e| PipelineError::Load(format!("{}: {}", descriptor.name, e)))?;
        let tonality: Tonality = DEFAULT_TONAL_CENTER.parse()?;

        info!(model = %descriptor.name, backend = backend.name(), "Loaded task-tuned model");
        Ok(Self {
            descriptor,
            model,
            encoder: backend.chord_encoder(),
            vocabulary: backend.vocabulary(),
            tonality,
        })
    }

    fn transcribe(&self, tokens: &[Token]) -> Result<String> {
        let labels = tokens
            .iter()
            .map(|&token| {
                self.vocabulary
                    .label(token)
                    .ok_or_else(|| PipelineError::Postprocess(format!("token {} has no vocabulary label", token)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(labels.join(" "))
    }
}

impl Pipeline for TaskTunedPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::TaskTuned
    }

    fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    fn preprocess(&self, source: &Path, request: &GenerationRequest) -> Result<PreparedInput> {
        check_source(source)?;

        let chord_prompt = match request.chord_progression()? {
            Some(progression) => {
                let prompt = self
                    .encoder
                    .encode(&progression, &self.tonality, request.split_measure, request.tempo)
                    .map_err(|e| PipelineError::Preprocess(format!("chord encoding failed: {}", e)))?;
                debug!(
                    model = %self.descriptor.name,
                    chords = progression.len(),
                    tokens = prompt.len(),
                    "Built chord prompt"
                );
                Some(prompt)
            }
            None => None,
        };

        Ok(PreparedInput {
            source: source.to_path_buf(),
            request: request.clone(),
            chord_prompt,
        })
    }

    fn generate(&mut self, input: PreparedInput, save_dir: &Path) -> Result<GeneratedOutput> {
        let raw_path = raw_output_path(save_dir, &input.source)?;
        let job = TaskJob {
            prompt: &input.source,
            programs: &input.request.program,
            task: &input.request.task,
            tempo: input.request.tempo,
            chord_prompt: input.chord_prompt.as_deref(),
            sampling: input.request.sampling(),
            raw_output: &raw_path,
        };

        debug!(model = %self.descriptor.name, task = %input.request.task, "Generating for task");
        let tokens = self
            .model
            .generate_for_task(&job)
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        if input.request.is_chord_task() {
            Ok(GeneratedOutput::Transcript {
                tokens: tokens.unwrap_or_default(),
                raw_path,
            })
        } else {
            Ok(GeneratedOutput::Performance { raw_path })
        }
    }

    fn postprocess(&self, save_dir: &Path, output: GeneratedOutput) -> Result<PathBuf> {
        match output {
            GeneratedOutput::Performance { raw_path } => finalize_performance(save_dir, &raw_path),
            GeneratedOutput::Transcript { tokens, raw_path } => {
                let line = self.transcribe(&tokens)?;
                let path = save_dir.join(CHORD_OUTPUT_FILE);
                fs::write(&path, format!("{}\n", line))
                    .map_err(|e| PipelineError::Postprocess(format!("failed to write '{}': {}", path.display(), e)))?;

                // Transcript and performance outputs are mutually exclusive
                if raw_path.exists() {
                    warn!(raw = %raw_path.display(), "Removing performance written for a transcript task");
                    fs::remove_file(&raw_path).map_err(|e| {
                        PipelineError::Postprocess(format!("failed to remove '{}': {}", raw_path.display(), e))
                    })?;
                }

                Ok(path)
            }
        }
    }
}
