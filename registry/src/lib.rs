/// Cadenza Model Registry
///
/// **Build-once catalog of installed generation models.**
///
/// The registry walks a model-storage root exactly once at startup and turns
/// every `<root>/<folder>/data.json` into a [`ModelDescriptor`]. The result is
/// an immutable value that the controller receives by injection; nothing here
/// is global and nothing mutates after [`ModelRegistry::scan`] returns.
///
/// Broken folders never abort the scan. Each one is recorded as a
/// [`CatalogEntryError`] and can be inspected through
/// [`ModelRegistry::catalog_errors`].
///
/// # Example
///
/// ```no_run
/// use cadenza_registry::ModelRegistry;
///
/// let registry = ModelRegistry::scan("data/models");
/// for descriptor in registry.list() {
///     println!("{} -> {}", descriptor.name, descriptor.folder_path.display());
/// }
/// for skipped in registry.catalog_errors() {
///     eprintln!("skipped {}", skipped);
/// }
/// ```

pub mod constants;
pub mod descriptor;
pub mod error;
pub mod registry;

pub use constants::*;
pub use descriptor::{KindTag, ModelDescriptor, ModelMetadata};
pub use error::{CatalogEntryError, CatalogEntryReason, RegistryError, Result};
pub use registry::{ModelListing, ModelRegistry};
