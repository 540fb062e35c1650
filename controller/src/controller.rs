/// Model Controller
///
/// Coordinates one generation request end to end:
/// registry lookup → pipeline (factory or cache) → preprocess → generate →
/// postprocess → result.
///
/// Stages are synchronous and may take minutes; the async entry point moves
/// them onto the blocking pool behind a semaphore so at most
/// `max_concurrent_generations` run at once.
use crate::cache::{CachePolicy, PipelineCache, SharedPipeline};
use crate::error::{ControllerError, Result};
use crate::result::GenerationResult;
use crate::stage::{Stage, StageTracker};
use cadenza_pipeline::{GenerationRequest, InferenceBackend, PipelineError, PipelineFactory};
use cadenza_registry::{CatalogEntryError, ModelDescriptor, ModelListing, ModelRegistry};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

pub const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 2;

/// Configuration for controller initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Size of the generation worker pool
    pub max_concurrent_generations: usize,
    pub cache_policy: CachePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: DEFAULT_MAX_CONCURRENT_GENERATIONS,
            cache_policy: CachePolicy::PerRequest,
        }
    }
}

/// Routes generation requests to model pipelines.
///
/// Cheap to clone; clones share the registry, cache and worker pool.
#[derive(Clone)]
pub struct ModelController {
    registry: Arc<ModelRegistry>,
    factory: Arc<PipelineFactory>,
    backend: Arc<dyn InferenceBackend>,
    cache: Arc<PipelineCache>,
    workers: Arc<Semaphore>,
}

impl ModelController {
    pub fn new(
        registry: Arc<ModelRegistry>,
        factory: PipelineFactory,
        backend: Arc<dyn InferenceBackend>,
        config: ControllerConfig,
    ) -> Self {
        let permits = config.max_concurrent_generations.max(1);
        info!(
            models = registry.len(),
            backend = backend.name(),
            workers = permits,
            cache = ?config.cache_policy,
            "Initializing ModelController"
        );

        Self {
            registry,
            factory: Arc::new(factory),
            backend,
            cache: Arc::new(PipelineCache::new(config.cache_policy)),
            workers: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Controller with the stock factory registrations and default config.
    pub fn with_defaults(registry: Arc<ModelRegistry>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self::new(
            registry,
            PipelineFactory::with_default_registrations(),
            backend,
            ControllerConfig::default(),
        )
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// Ordinal-indexed metadata of every registered model.
    pub fn list_models(&self) -> ModelListing {
        self.registry.listing()
    }

    pub fn has_model(&self, model_type: &str) -> bool {
        self.registry.contains(model_type)
    }

    /// Folders skipped during the registry scan.
    pub fn catalog_errors(&self) -> &[CatalogEntryError] {
        self.registry.catalog_errors()
    }

    /// Run a request on the blocking pool.
    ///
    /// Unknown models are rejected before waiting for a worker.
    pub async fn generate(
        &self,
        model_type: impl Into<String>,
        source: impl Into<PathBuf>,
        request: GenerationRequest,
        save_dir: impl Into<PathBuf>,
    ) -> Result<GenerationResult> {
        let model_type = model_type.into();
        if !self.registry.contains(&model_type) {
            return Err(ControllerError::UnknownModel { model: model_type });
        }

        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ControllerError::Worker {
                model: model_type.clone(),
                message: e.to_string(),
            })?;

        let this = self.clone();
        let source = source.into();
        let save_dir = save_dir.into();
        let model = model_type.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            this.generate_blocking(&model, &source, &request, &save_dir)
        });

        handle.await.map_err(|e| ControllerError::Worker {
            model: model_type,
            message: e.to_string(),
        })?
    }

    /// Run a request on the calling thread.
    ///
    /// Nothing is written under `save_dir` unless the model is registered.
    pub fn generate_blocking(
        &self,
        model_type: &str,
        source: &Path,
        request: &GenerationRequest,
        save_dir: &Path,
    ) -> Result<GenerationResult> {
        let mut tracker = StageTracker::new(model_type);

        let result = self.run_stages(&mut tracker, model_type, source, request, save_dir);
        match &result {
            Ok(result) => {
                tracker.advance();
                info!(
                    model = model_type,
                    output = %result.output_file.display(),
                    stage = %tracker.current(),
                    "Generation finished"
                );
            }
            Err(e) => {
                let failed_at = tracker.fail();
                error!(
                    model = model_type,
                    stage = %failed_at,
                    kind = e.kind(),
                    error = %e,
                    "Generation failed"
                );
            }
        }
        result
    }

    fn run_stages(
        &self,
        tracker: &mut StageTracker<'_>,
        model_type: &str,
        source: &Path,
        request: &GenerationRequest,
        save_dir: &Path,
    ) -> Result<GenerationResult> {
        // VALIDATING
        let descriptor = self
            .registry
            .get(model_type)
            .ok_or_else(|| ControllerError::UnknownModel {
                model: model_type.to_string(),
            })?;
        request
            .validate()
            .map_err(|e| ControllerError::from_pipeline(model_type, Stage::Validating, e))?;
        if request.model_type != model_type {
            debug!(
                model = model_type,
                requested = %request.model_type,
                "Request names a different model, routing by the explicit model"
            );
        }

        // LOADING
        tracker.advance();
        let pipeline = self.obtain_pipeline(descriptor)?;
        let fail = |stage: Stage, e: PipelineError| ControllerError::from_pipeline(model_type, stage, e);

        // PREPROCESSING
        tracker.advance();
        fs::create_dir_all(save_dir).map_err(|e| {
            fail(
                Stage::Preprocessing,
                PipelineError::Preprocess(format!("cannot create '{}': {}", save_dir.display(), e)),
            )
        })?;

        let mut pipeline_guard = pipeline.lock();
        let input = pipeline_guard
            .preprocess(source, request)
            .map_err(|e| fail(Stage::Preprocessing, e))?;

        // GENERATING
        tracker.advance();
        let output = match pipeline_guard.generate(input, save_dir) {
            Ok(output) => output,
            Err(e) => {
                // A cached model that failed mid-run is not reused
                self.cache.invalidate(model_type);
                return Err(fail(Stage::Generating, e));
            }
        };

        // POSTPROCESSING
        tracker.advance();
        let output_file = pipeline_guard
            .postprocess(save_dir, output)
            .map_err(|e| fail(Stage::Postprocessing, e))?;

        Ok(GenerationResult::success(model_type, save_dir.to_path_buf(), output_file))
    }

    /// Cached instance, or a freshly loaded one (kept if the policy allows).
    fn obtain_pipeline(&self, descriptor: Arc<ModelDescriptor>) -> Result<SharedPipeline> {
        if let Some(cached) = self.cache.get(&descriptor.name) {
            debug!(model = %descriptor.name, "Using cached pipeline");
            return Ok(cached);
        }

        let name = descriptor.name.clone();
        let pipeline = self
            .factory
            .create(descriptor, self.backend.as_ref())
            .map_err(|e| ControllerError::from_pipeline(&name, Stage::Loading, e))?;

        let shared: SharedPipeline = Arc::new(Mutex::new(pipeline));
        self.cache.insert(&name, shared.clone());
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_pipeline::ReplayBackend;
    use serde_json::json;
    use tempfile::TempDir;

    fn controller_with_model(models: &TempDir) -> ModelController {
        let folder = models.path().join("base");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("config.json"), "{}").unwrap();
        fs::write(folder.join("model.pth"), b"weights").unwrap();
        let descriptor =
            ModelDescriptor::from_metadata(&folder, json!({"model_name": "MORTM4.1-SAX", "tag": "pretrained"})).unwrap();

        ModelController::with_defaults(
            Arc::new(ModelRegistry::from_descriptors([descriptor])),
            Arc::new(ReplayBackend::new()),
        )
    }

    #[test]
    fn test_save_dir_failure_tracked_at_preprocessing() {
        let models = TempDir::new().unwrap();
        let controller = controller_with_model(&models);

        // A regular file where the save directory's parent should be
        let blocker = models.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        let save_dir = blocker.join("run");

        let request = GenerationRequest::new("MORTM4.1-SAX", vec![0], 120);
        let mut tracker = StageTracker::new("MORTM4.1-SAX");
        let err = controller
            .run_stages(&mut tracker, "MORTM4.1-SAX", Path::new("in.mid"), &request, &save_dir)
            .unwrap_err();

        assert_eq!(err.kind(), "PreprocessError");
        assert_eq!(err.stage(), Some(Stage::Preprocessing));
        assert_eq!(tracker.current(), Stage::Preprocessing);
    }
}
