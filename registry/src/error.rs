use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Registry errors.
///
/// Only failures that make the whole catalog unusable live here. Per-folder
/// problems are reported as [`CatalogEntryError`] and never abort a scan.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read model root {path:?}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Why a model folder was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntryReason {
    /// The folder has no metadata file.
    MissingMetadata,
    /// The directory entry itself could not be read while listing the root.
    EntryUnreadable(String),
    /// The metadata file exists but could not be read.
    Unreadable(String),
    /// The metadata file is not valid JSON or has the wrong shape.
    Malformed(String),
    /// The metadata does not declare a model name.
    MissingName,
    /// Another folder already registered this name.
    DuplicateName { name: String, kept: PathBuf },
}

impl fmt::Display for CatalogEntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata => write!(f, "metadata file not found"),
            Self::EntryUnreadable(msg) => write!(f, "directory entry unreadable: {}", msg),
            Self::Unreadable(msg) => write!(f, "metadata unreadable: {}", msg),
            Self::Malformed(msg) => write!(f, "metadata malformed: {}", msg),
            Self::MissingName => write!(f, "metadata does not declare a model name"),
            Self::DuplicateName { name, kept } => {
                write!(f, "model name '{}' already registered from {}", name, kept.display())
            }
        }
    }
}

/// A model folder skipped during the scan.
///
/// Non-fatal: scanning continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}", path = .folder.display())]
pub struct CatalogEntryError {
    pub folder: PathBuf,
    pub reason: CatalogEntryReason,
}

impl CatalogEntryError {
    pub fn new(folder: impl Into<PathBuf>, reason: CatalogEntryReason) -> Self {
        Self {
            folder: folder.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_display() {
        let err = CatalogEntryError::new("/models/broken", CatalogEntryReason::MissingName);
        assert_eq!(
            err.to_string(),
            "/models/broken: metadata does not declare a model name"
        );
    }
}
