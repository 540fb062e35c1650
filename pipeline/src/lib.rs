/// Cadenza Pipeline Crate
///
/// **Model-family-specific generation strategies.**
///
/// # Architecture
///
/// - **`factory`**: ordered `(keyword, family)` table; first match wins
/// - **`base`**: the `Pipeline` contract (preprocess / generate / postprocess)
/// - **`pretrained`** / **`task_tuned`**: the two behavior variants
/// - **`backend`**: the opaque inference seam; `replay` is the reference backend
///
/// # Example
///
/// ```no_run
/// use cadenza_pipeline::{GenerationRequest, PipelineFactory, ReplayBackend};
/// use cadenza_registry::ModelRegistry;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = ModelRegistry::scan("data/models");
/// let descriptor = registry.get("MORTM4.1-SAX").ok_or("model not installed")?;
///
/// let factory = PipelineFactory::with_default_registrations();
/// let mut pipeline = factory.create(descriptor, &ReplayBackend::new())?;
///
/// let request = GenerationRequest::new("MORTM4.1-SAX", vec![0], 120);
/// let save_dir = Path::new("data/saves/run-1");
/// let input = pipeline.preprocess(&save_dir.join("input.mid"), &request)?;
/// let output = pipeline.generate(input, save_dir)?;
/// let artifact = pipeline.postprocess(save_dir, output)?;
/// println!("wrote {}", artifact.display());
/// # Ok(())
/// # }
/// ```

pub mod backend;
pub mod base;
pub mod chords;
pub mod error;
pub mod factory;
pub mod performance;
pub mod pretrained;
pub mod replay;
pub mod request;
pub mod task_tuned;
pub mod types;

pub use backend::{
    ChordEncoder, ContinuationJob, InferenceBackend, LoadedModel, ModelFiles, SamplingParams, TaskJob, Vocabulary,
};
pub use base::{finalize_performance, raw_output_path, GeneratedOutput, Pipeline, PreparedInput};
pub use chords::{ChordProgression, ReferenceChordEncoder, ReferenceVocabulary, Tonality};
pub use error::{BackendError, PipelineError, Result};
pub use factory::{PipelineFactory, PipelineFamily, Registration, MORTM_BASE_KEYWORD, MORTM_PRO_KEYWORD};
pub use performance::{validate_performance, PerformanceSummary};
pub use pretrained::PretrainedPipeline;
pub use replay::ReplayBackend;
pub use request::GenerationRequest;
pub use task_tuned::TaskTunedPipeline;
pub use types::{
    PipelineKind, Token, CHORD_OUTPUT_FILE, DEFAULT_TONAL_CENTER, INPUT_FILE, OUTPUT_FILE, RAW_OUTPUT_PREFIX,
    TASK_CHORD_GEM,
};
