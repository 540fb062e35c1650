//! Model Registry - filesystem-backed catalog
//!
//! Scans `<root>/<folder>/data.json` once and keeps the result in memory.
//! Catalog order is the filesystem enumeration order of the root directory.

use crate::constants::METADATA_FILE;
use crate::descriptor::{ModelDescriptor, ModelMetadata};
use crate::error::{CatalogEntryError, CatalogEntryReason, RegistryError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ordinal-indexed view of the catalog (`0 -> metadata`, `1 -> metadata`, ...).
pub type ModelListing = BTreeMap<usize, ModelMetadata>;

/// Immutable catalog of installed models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    root: PathBuf,
    descriptors: Vec<Arc<ModelDescriptor>>,
    by_name: HashMap<String, usize>,
    catalog_errors: Vec<CatalogEntryError>,
}

impl ModelRegistry {
    /// Scan a model root, tolerating a missing or unreadable root.
    ///
    /// A root that cannot be listed yields an empty catalog and a warning.
    pub fn scan(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        match Self::try_scan(root) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Model root unavailable, starting with an empty catalog");
                Self {
                    root: root.to_path_buf(),
                    ..Self::default()
                }
            }
        }
    }

    /// Scan a model root, failing only if the root itself cannot be listed.
    ///
    /// A root that does not exist is not an error: it holds no models.
    pub fn try_scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut registry = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        if !root.is_dir() {
            info!(root = %root.display(), "Model root does not exist, catalog is empty");
            return Ok(registry);
        }

        let entries = std::fs::read_dir(root).map_err(|source| RegistryError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        registry.scan_entries(root, entries.map(|entry| entry.map(|e| e.path())));

        info!(
            root = %root.display(),
            models = registry.descriptors.len(),
            skipped = registry.catalog_errors.len(),
            "Model scan complete"
        );

        Ok(registry)
    }

    /// Build a registry from already-constructed descriptors.
    ///
    /// Later duplicates are recorded as catalog errors, as in a scan.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            registry.insert(descriptor);
        }
        registry
    }

    /// Register every listed folder. A failed entry is recorded against the
    /// root and the walk continues.
    fn scan_entries(&mut self, root: &Path, entries: impl IntoIterator<Item = std::io::Result<PathBuf>>) {
        for entry in entries {
            let folder = match entry {
                Ok(folder) => folder,
                Err(e) => {
                    self.skip(CatalogEntryError::new(root, CatalogEntryReason::EntryUnreadable(e.to_string())));
                    continue;
                }
            };
            if !folder.is_dir() {
                debug!(path = %folder.display(), "Skipping non-directory entry");
                continue;
            }
            self.scan_folder(&folder);
        }
    }

    fn scan_folder(&mut self, folder: &Path) {
        match read_descriptor(folder) {
            Ok(descriptor) => self.insert(descriptor),
            Err(reason) => self.skip(CatalogEntryError::new(folder, reason)),
        }
    }

    fn insert(&mut self, descriptor: ModelDescriptor) {
        if let Some(&existing) = self.by_name.get(&descriptor.name) {
            let kept = self.descriptors[existing].folder_path.clone();
            let reason = CatalogEntryReason::DuplicateName {
                name: descriptor.name.clone(),
                kept,
            };
            self.skip(CatalogEntryError::new(descriptor.folder_path, reason));
            return;
        }

        info!(model = %descriptor.name, tag = %descriptor.kind_tag, folder = %descriptor.folder_path.display(), "Found model");
        self.by_name.insert(descriptor.name.clone(), self.descriptors.len());
        self.descriptors.push(Arc::new(descriptor));
    }

    fn skip(&mut self, error: CatalogEntryError) {
        warn!(folder = %error.folder.display(), reason = %error.reason, "Skipping model folder");
        self.catalog_errors.push(error);
    }

    /// Root directory this catalog was scanned from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a descriptor by model name.
    pub fn get(&self, name: &str) -> Option<Arc<ModelDescriptor>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.descriptors[index]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Descriptors in catalog order.
    pub fn list(&self) -> &[Arc<ModelDescriptor>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Ordinal-indexed metadata listing for introspection.
    pub fn listing(&self) -> ModelListing {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(ordinal, descriptor)| (ordinal, descriptor.metadata.clone()))
            .collect()
    }

    /// Folders skipped during the scan, in the order they were met.
    pub fn catalog_errors(&self) -> &[CatalogEntryError] {
        &self.catalog_errors
    }
}

fn read_descriptor(folder: &Path) -> std::result::Result<ModelDescriptor, CatalogEntryReason> {
    let metadata_path = folder.join(METADATA_FILE);
    if !metadata_path.is_file() {
        return Err(CatalogEntryReason::MissingMetadata);
    }

    let contents = std::fs::read_to_string(&metadata_path)
        .map_err(|e| CatalogEntryReason::Unreadable(e.to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| CatalogEntryReason::Malformed(e.to_string()))?;

    ModelDescriptor::from_metadata(folder, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::KindTag;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_model(root: &Path, folder: &str, metadata: &str) -> PathBuf {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).expect("create model dir");
        fs::write(dir.join(METADATA_FILE), metadata).expect("write metadata");
        dir
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let registry = ModelRegistry::scan(temp.path().join("nope"));
        assert!(registry.is_empty());
        assert!(registry.catalog_errors().is_empty());
    }

    #[test]
    fn test_single_model_listing() {
        let temp = TempDir::new().expect("temp dir");
        let folder = write_model(
            temp.path(),
            "modelA",
            r#"{"model_name": "Fam-X", "tag": "pretrained"}"#,
        );

        let registry = ModelRegistry::scan(temp.path());
        assert_eq!(registry.len(), 1);

        let listing = registry.listing();
        assert_eq!(listing.len(), 1);
        let entry = &listing[&0];
        assert_eq!(entry["model_name"], json!("Fam-X"));
        assert_eq!(entry["tag"], json!("pretrained"));
        assert_eq!(entry["model_folder_path"], json!(folder.to_string_lossy()));

        let descriptor = registry.get("Fam-X").expect("registered");
        assert_eq!(descriptor.kind_tag, KindTag::Pretrained);
        assert_eq!(descriptor.folder_path, folder);
    }

    #[test]
    fn test_broken_folders_are_recorded_not_fatal() {
        let temp = TempDir::new().expect("temp dir");
        write_model(temp.path(), "good", r#"{"model_name": "Good", "tag": "sft"}"#);
        write_model(temp.path(), "bad_json", "{ not json");
        write_model(temp.path(), "no_name", r#"{"tag": "pretrained"}"#);
        fs::create_dir_all(temp.path().join("empty")).expect("empty dir");
        fs::write(temp.path().join("README.txt"), "not a model").expect("stray file");

        let registry = ModelRegistry::scan(temp.path());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("Good"));

        let mut reasons: Vec<_> = registry
            .catalog_errors()
            .iter()
            .map(|e| {
                let folder = e.folder.file_name().unwrap().to_string_lossy().into_owned();
                (folder, e.reason.clone())
            })
            .collect();
        reasons.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(reasons.len(), 3);
        assert!(matches!(reasons[0], (ref f, CatalogEntryReason::Malformed(_)) if f == "bad_json"));
        assert_eq!(reasons[1], ("empty".to_string(), CatalogEntryReason::MissingMetadata));
        assert_eq!(reasons[2], ("no_name".to_string(), CatalogEntryReason::MissingName));
    }

    #[test]
    fn test_unreadable_entry_keeps_partial_catalog() {
        let temp = TempDir::new().expect("temp dir");
        let a = write_model(temp.path(), "a", r#"{"model_name": "A", "tag": "pretrained"}"#);
        let b = write_model(temp.path(), "b", r#"{"model_name": "B", "tag": "sft"}"#);
        let c = write_model(temp.path(), "c", r#"{"model_name": "C", "tag": "sft"}"#);

        let mut registry = ModelRegistry {
            root: temp.path().to_path_buf(),
            ..ModelRegistry::default()
        };
        let entries = vec![
            Ok(a),
            Ok(b),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "stale handle")),
            Ok(c),
        ];
        registry.scan_entries(temp.path(), entries);

        let names: Vec<_> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(registry.catalog_errors().len(), 1);
        let skipped = &registry.catalog_errors()[0];
        assert_eq!(skipped.folder, temp.path());
        assert!(matches!(skipped.reason, CatalogEntryReason::EntryUnreadable(ref m) if m.contains("stale handle")));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let first = ModelDescriptor::from_metadata(
            Path::new("/models/a"),
            json!({"model_name": "Same", "tag": "pretrained"}),
        )
        .unwrap();
        let second = ModelDescriptor::from_metadata(
            Path::new("/models/b"),
            json!({"model_name": "Same", "tag": "sft"}),
        )
        .unwrap();

        let registry = ModelRegistry::from_descriptors([first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Same").unwrap().folder_path, PathBuf::from("/models/a"));
        assert_eq!(registry.catalog_errors().len(), 1);
        assert!(matches!(
            registry.catalog_errors()[0].reason,
            CatalogEntryReason::DuplicateName { .. }
        ));
    }
}
