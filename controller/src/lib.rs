//! Cadenza Controller
//!
//! Request orchestration on top of the registry and the pipeline crate:
//! model lookup, pipeline creation or reuse, the stage state machine, and a
//! bounded pool of blocking generation workers.
//!
//! # Example
//!
//! ```no_run
//! use cadenza_controller::{ModelController, SaveDirectory};
//! use cadenza_pipeline::{GenerationRequest, ReplayBackend};
//! use cadenza_registry::ModelRegistry;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ModelRegistry::scan("data/models"));
//! let controller = ModelController::with_defaults(registry, Arc::new(ReplayBackend::new()));
//!
//! let save = SaveDirectory::allocate(Path::new("data/saves"));
//! let request = GenerationRequest::new("MORTM4.1-SAX", vec![0], 120);
//! let result = controller
//!     .generate("MORTM4.1-SAX", save.path.join("input.mid"), request, save.path.clone())
//!     .await?;
//! println!("{}", result.output_file.display());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod controller;
pub mod error;
pub mod result;
pub mod save;
pub mod stage;

pub use cache::{CachePolicy, CacheStats, LruCache, PipelineCache, SharedPipeline};
pub use controller::{ControllerConfig, ModelController, DEFAULT_MAX_CONCURRENT_GENERATIONS};
pub use error::{ControllerError, Result};
pub use result::{GenerationResult, STATUS_SUCCESS};
pub use save::SaveDirectory;
pub use stage::Stage;
