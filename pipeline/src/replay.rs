/// Replay backend - Reference `InferenceBackend` without a neural network
///
/// Checks that a model folder is loadable (config object, weights file) and
/// "generates" by re-emitting the prompt performance with the requested
/// instrument programs. Chord tasks echo the conditioning prompt, or the
/// prompt's pitches when there is none.
use crate::backend::{ChordEncoder, ContinuationJob, InferenceBackend, LoadedModel, ModelFiles, TaskJob, Vocabulary};
use crate::chords::{pitch_token, ReferenceChordEncoder, ReferenceVocabulary};
use crate::error::BackendError;
use crate::performance::{note_pitches, reinstrument};
use crate::types::{Token, TASK_CHORD_GEM};
use cadenza_registry::ModelDescriptor;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct ReplayBackend;

impl ReplayBackend {
    pub fn new() -> Self {
        Self
    }
}

impl InferenceBackend for ReplayBackend {
    fn name(&self) -> &str {
        "replay"
    }

    fn load(&self, descriptor: &ModelDescriptor, files: &ModelFiles) -> Result<Box<dyn LoadedModel>, BackendError> {
        let raw = fs::read_to_string(&files.config)
            .map_err(|e| BackendError::new(format!("cannot read '{}': {}", files.config.display(), e)))?;
        let config: Value = serde_json::from_str(&raw)
            .map_err(|e| BackendError::new(format!("invalid config '{}': {}", files.config.display(), e)))?;
        if !config.is_object() {
            return Err(BackendError::new(format!(
                "config '{}' must be a JSON object",
                files.config.display()
            )));
        }
        if !files.weights.is_file() {
            return Err(BackendError::new(format!(
                "weights '{}' not found",
                files.weights.display()
            )));
        }

        debug!(model = %descriptor.name, keys = config.as_object().map_or(0, |c| c.len()), "Replay model ready");
        Ok(Box::new(ReplayModel))
    }

    fn chord_encoder(&self) -> Arc<dyn ChordEncoder> {
        Arc::new(ReferenceChordEncoder)
    }

    fn vocabulary(&self) -> Arc<dyn Vocabulary> {
        Arc::new(ReferenceVocabulary)
    }
}

struct ReplayModel;

impl ReplayModel {
    fn replay(prompt: &Path, programs: &[u8], raw_output: &Path) -> Result<(), BackendError> {
        let bytes = fs::read(prompt)?;
        let out = reinstrument(&bytes, programs)?;
        fs::write(raw_output, out)?;
        Ok(())
    }
}

impl LoadedModel for ReplayModel {
    fn continue_performance(&mut self, job: &ContinuationJob<'_>) -> Result<(), BackendError> {
        Self::replay(job.prompt, job.programs, job.raw_output)
    }

    fn generate_for_task(&mut self, job: &TaskJob<'_>) -> Result<Option<Vec<Token>>, BackendError> {
        if job.task == TASK_CHORD_GEM {
            let tokens = match job.chord_prompt {
                Some(prompt) => prompt.to_vec(),
                None => note_pitches(&fs::read(job.prompt)?)?
                    .into_iter()
                    .map(pitch_token)
                    .collect(),
            };
            return Ok(Some(tokens));
        }

        Self::replay(job.prompt, job.programs, job.raw_output)?;
        Ok(None)
    }
}
