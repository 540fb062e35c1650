/// Pipeline contract - Shared by every model family
///
/// Loading happens when a variant is constructed; the three remaining stages
/// run in order against one save directory. Each stage maps its failure onto
/// its own `PipelineError` variant so callers can tell where a run stopped.
use crate::error::{PipelineError, Result};
use crate::request::GenerationRequest;
use crate::types::{PipelineKind, Token, OUTPUT_FILE, RAW_OUTPUT_PREFIX};
use cadenza_registry::ModelDescriptor;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output of the preprocess stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInput {
    /// Validated source performance
    pub source: PathBuf,
    /// Copy of the caller's request
    pub request: GenerationRequest,
    /// Chord-conditioning prompt, when one was built
    pub chord_prompt: Option<Vec<Token>>,
}

/// Raw output of the generate stage, before postprocessing.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedOutput {
    /// Backend wrote a performance at `raw_path`
    Performance { raw_path: PathBuf },
    /// Backend returned tokens to transcribe
    Transcript { tokens: Vec<Token>, raw_path: PathBuf },
}

impl GeneratedOutput {
    pub fn raw_path(&self) -> &Path {
        match self {
            Self::Performance { raw_path } | Self::Transcript { raw_path, .. } => raw_path,
        }
    }
}

/// Model-family-specific generation strategy.
pub trait Pipeline: Send {
    fn kind(&self) -> PipelineKind;

    fn descriptor(&self) -> &Arc<ModelDescriptor>;

    /// Validate the upload and derive model inputs. Never mutates `request`.
    fn preprocess(&self, source: &Path, request: &GenerationRequest) -> Result<PreparedInput>;

    /// Run the loaded model. Raw outputs land in `save_dir`.
    fn generate(&mut self, input: PreparedInput, save_dir: &Path) -> Result<GeneratedOutput>;

    /// Produce exactly one artifact and return its path.
    fn postprocess(&self, save_dir: &Path, output: GeneratedOutput) -> Result<PathBuf>;
}

/// Where a backend writes the raw output for `source`.
pub fn raw_output_path(save_dir: &Path, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PipelineError::Generation(format!("source '{}' has no file name", source.display())))?;

    let mut raw_name = std::ffi::OsString::from(RAW_OUTPUT_PREFIX);
    raw_name.push(file_name);
    Ok(save_dir.join(raw_name))
}

/// Rename a raw performance to `output.mid`.
pub fn finalize_performance(save_dir: &Path, raw_path: &Path) -> Result<PathBuf> {
    if !raw_path.is_file() {
        return Err(PipelineError::Postprocess(format!(
            "expected generated file '{}' was not produced",
            raw_path.display()
        )));
    }

    let output = save_dir.join(OUTPUT_FILE);
    fs::rename(raw_path, &output).map_err(|e| {
        PipelineError::Postprocess(format!("failed to move '{}' into place: {}", raw_path.display(), e))
    })?;

    Ok(output)
}

/// Shared preprocess step: the upload must be a readable performance.
pub(crate) fn check_source(source: &Path) -> Result<()> {
    crate::performance::validate_performance_file(source)
        .map(|summary| {
            tracing::debug!(
                source = %source.display(),
                tracks = summary.tracks,
                notes = summary.notes,
                "Source performance accepted"
            );
        })
        .map_err(|e| PipelineError::Preprocess(format!("'{}' is not a readable performance: {}", source.display(), e)))
}
