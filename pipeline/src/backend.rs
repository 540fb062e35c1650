/// Inference backend seam - Thin contract around the opaque model
///
/// **Opaque**: network architecture, tokenization and sampling live behind
/// these traits. Pipelines only decide *what* to ask for and *where* the
/// result goes; a backend decides *how* it is produced.
use crate::chords::{ChordProgression, Tonality};
use crate::error::BackendError;
use crate::types::Token;
use cadenza_registry::{ModelDescriptor, CONFIG_FILE, WEIGHTS_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Files the load stage reads from a model folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    pub fn for_descriptor(descriptor: &ModelDescriptor) -> Self {
        Self {
            config: descriptor.file(CONFIG_FILE),
            weights: descriptor.file(WEIGHTS_FILE),
        }
    }
}

/// Sampling controls forwarded to the model unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Softmax temperature
    pub temperature: f32,
    /// Nucleus cutoff
    pub p: f32,
    /// Upper bound on measures used per generation segment
    pub split_measure: u32,
}

/// Unconditional continuation of a prompt performance.
#[derive(Debug, Clone, Copy)]
pub struct ContinuationJob<'a> {
    pub prompt: &'a Path,
    pub programs: &'a [u8],
    pub sampling: SamplingParams,
    /// Where the backend must write the raw generated performance
    pub raw_output: &'a Path,
}

/// Task-conditioned generation.
#[derive(Debug, Clone, Copy)]
pub struct TaskJob<'a> {
    pub prompt: &'a Path,
    pub programs: &'a [u8],
    pub task: &'a str,
    pub tempo: u32,
    pub chord_prompt: Option<&'a [Token]>,
    pub sampling: SamplingParams,
    /// Where the backend writes a performance, for tasks that produce one
    pub raw_output: &'a Path,
}

/// A model in inference-ready state.
///
/// Owned exclusively by one pipeline instance.
pub trait LoadedModel: Send {
    /// Generate a continuation and write it to `job.raw_output`.
    fn continue_performance(&mut self, job: &ContinuationJob<'_>) -> Result<(), BackendError>;

    /// Run a task. Returns the generated token sequence when the task yields
    /// one; performance-producing tasks write `job.raw_output` instead.
    fn generate_for_task(&mut self, job: &TaskJob<'_>) -> Result<Option<Vec<Token>>, BackendError>;
}

/// Turns chord labels and onset times into a conditioning prompt.
pub trait ChordEncoder: Send + Sync {
    fn encode(
        &self,
        progression: &ChordProgression,
        tonality: &Tonality,
        split_measure: u32,
        tempo: u32,
    ) -> Result<Vec<Token>, BackendError>;
}

/// Maps token ids back to human-readable labels.
pub trait Vocabulary: Send + Sync {
    fn label(&self, token: Token) -> Option<String>;
}

/// The external model-inference capability.
pub trait InferenceBackend: Send + Sync {
    /// Backend name (for logging)
    fn name(&self) -> &str;

    /// Read config and weights and return an inference-ready model.
    ///
    /// Blocking and expensive; never called on an async worker thread.
    fn load(&self, descriptor: &ModelDescriptor, files: &ModelFiles) -> Result<Box<dyn LoadedModel>, BackendError>;

    fn chord_encoder(&self) -> Arc<dyn ChordEncoder>;

    fn vocabulary(&self) -> Arc<dyn Vocabulary>;
}
