/// Pipeline factory - Keyword routing from model name to pipeline family
///
/// **Ordered table**: registrations are checked in the order they were added
/// and the first keyword contained in the model name wins. A shorter keyword
/// registered earlier beats a longer, more specific one registered later.
///
/// **Never caches**: every `create` call runs the load stage.
use crate::backend::InferenceBackend;
use crate::base::Pipeline;
use crate::error::{PipelineError, Result};
use crate::pretrained::PretrainedPipeline;
use crate::task_tuned::TaskTunedPipeline;
use crate::types::PipelineKind;
use cadenza_registry::ModelDescriptor;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default keyword for the base MORTM model.
pub const MORTM_BASE_KEYWORD: &str = "MORTM4.1-SAX";

/// Default keyword for the task-tuned MORTM model.
pub const MORTM_PRO_KEYWORD: &str = "MORTM4.1Pro-SAX";

/// Closed set of pipeline families this build can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineFamily {
    /// MORTM: pretrained continuation or task-tuned generation, by tag
    Mortm,
}

impl PipelineFamily {
    /// Resolve the behavior variant for a descriptor's kind tag.
    pub fn kind_for(&self, descriptor: &ModelDescriptor) -> Result<PipelineKind> {
        match self {
            Self::Mortm => {
                PipelineKind::from_kind_tag(&descriptor.kind_tag).ok_or_else(|| PipelineError::UnsupportedKindTag {
                    model: descriptor.name.clone(),
                    tag: descriptor.kind_tag.to_string(),
                })
            }
        }
    }

    /// Construct and load a pipeline of this family.
    pub fn instantiate(
        &self,
        descriptor: Arc<ModelDescriptor>,
        backend: &dyn InferenceBackend,
    ) -> Result<Box<dyn Pipeline>> {
        match self.kind_for(&descriptor)? {
            PipelineKind::Pretrained => Ok(Box::new(PretrainedPipeline::load(descriptor, backend)?)),
            PipelineKind::TaskTuned => Ok(Box::new(TaskTunedPipeline::load(descriptor, backend)?)),
        }
    }
}

impl fmt::Display for PipelineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mortm => write!(f, "MORTM"),
        }
    }
}

/// One `(keyword, family)` row of the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub keyword: String,
    pub family: PipelineFamily,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineFactory {
    registrations: Vec<Registration>,
}

impl PipelineFactory {
    /// Empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the stock MORTM registrations.
    pub fn with_default_registrations() -> Self {
        Self::new()
            .register(MORTM_BASE_KEYWORD, PipelineFamily::Mortm)
            .register(MORTM_PRO_KEYWORD, PipelineFamily::Mortm)
    }

    /// Append a registration. Earlier registrations take precedence.
    pub fn register(mut self, keyword: impl Into<String>, family: PipelineFamily) -> Self {
        self.registrations.push(Registration {
            keyword: keyword.into(),
            family,
        });
        self
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// First registration whose keyword occurs in the descriptor name.
    pub fn select(&self, descriptor: &ModelDescriptor) -> Result<&Registration> {
        self.registrations
            .iter()
            .find(|r| descriptor.name.contains(r.keyword.as_str()))
            .ok_or_else(|| PipelineError::NoSuitablePipeline {
                model: descriptor.name.clone(),
            })
    }

    /// Select a family and load a fresh pipeline instance (blocking).
    pub fn create(&self, descriptor: Arc<ModelDescriptor>, backend: &dyn InferenceBackend) -> Result<Box<dyn Pipeline>> {
        let registration = self.select(&descriptor)?;
        debug!(
            model = %descriptor.name,
            keyword = %registration.keyword,
            family = %registration.family,
            "Selected pipeline family"
        );
        registration.family.instantiate(descriptor, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_registry::KindTag;
    use serde_json::json;
    use std::path::Path;

    fn descriptor(name: &str, tag: &str) -> ModelDescriptor {
        ModelDescriptor::from_metadata(Path::new("/models/x"), json!({"model_name": name, "tag": tag})).unwrap()
    }

    #[test]
    fn test_defaults_registered_in_order() {
        let factory = PipelineFactory::with_default_registrations();
        let keywords: Vec<_> = factory.registrations().iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec![MORTM_BASE_KEYWORD, MORTM_PRO_KEYWORD]);
    }

    #[test]
    fn test_empty_factory_selects_nothing() {
        let err = PipelineFactory::new().select(&descriptor("MORTM4.1-SAX", "pretrained")).unwrap_err();
        assert!(matches!(err, PipelineError::NoSuitablePipeline { model } if model == "MORTM4.1-SAX"));
    }

    #[test]
    fn test_kind_for_unknown_tag() {
        let d = descriptor("MORTM4.1-SAX", "lora");
        assert_eq!(d.kind_tag, KindTag::Other("lora".into()));

        let err = PipelineFamily::Mortm.kind_for(&d).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedKindTag { tag, .. } if tag == "lora"));
    }
}
