/// Integration tests for the model registry - real folders on disk via tempfile
use cadenza_registry::{CatalogEntryReason, KindTag, ModelRegistry, METADATA_FILE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn install(root: &Path, folder: &str, metadata: &str) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).expect("Failed to create model folder");
    fs::write(dir.join(METADATA_FILE), metadata).expect("Failed to write metadata");
    fs::write(dir.join("config.json"), "{}").expect("Failed to write config");
}

fn populated_root() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    install(
        temp.path(),
        "mortm-base",
        r#"{"model_name": "MORTM4.1-SAX", "tag": {"model": "pretrained"}, "vocab_size": 1024}"#,
    );
    install(
        temp.path(),
        "mortm-pro",
        r#"{"model_name": "MORTM4.1Pro-SAX", "tag": {"model": "sft"}}"#,
    );
    install(temp.path(), "broken", "[1, 2, 3]");
    temp
}

#[test]
fn test_rescan_is_identical() {
    let temp = populated_root();

    let first = ModelRegistry::scan(temp.path());
    let second = ModelRegistry::scan(temp.path());

    let names = |r: &ModelRegistry| r.list().iter().map(|d| d.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&first), names(&second));
    assert_eq!(first.listing(), second.listing());
    assert_eq!(first.catalog_errors(), second.catalog_errors());
}

#[test]
fn test_listing_is_ordinal_and_dense() {
    let temp = populated_root();
    let registry = ModelRegistry::scan(temp.path());

    let listing = registry.listing();
    assert_eq!(listing.keys().copied().collect::<Vec<_>>(), vec![0, 1]);

    // Listing order follows catalog order
    for (ordinal, descriptor) in registry.list().iter().enumerate() {
        assert_eq!(listing[&ordinal]["model_name"], descriptor.name.as_str());
    }
}

#[test]
fn test_catalog_follows_read_dir_order() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    for name in ["zeta", "alpha", "mid", "omega", "beta", "kappa"] {
        install(
            temp.path(),
            name,
            &format!(r#"{{"model_name": "Model-{}", "tag": "pretrained"}}"#, name),
        );
    }

    let expected: Vec<_> = fs::read_dir(temp.path())
        .expect("Failed to list root")
        .map(|entry| entry.expect("Failed to read entry").path())
        .filter(|path| path.is_dir())
        .collect();

    let registry = ModelRegistry::scan(temp.path());
    let scanned: Vec<_> = registry.list().iter().map(|d| d.folder_path.clone()).collect();
    assert_eq!(scanned, expected);

    let listing = registry.listing();
    for (ordinal, folder) in expected.iter().enumerate() {
        assert_eq!(listing[&ordinal]["model_folder_path"], &*folder.to_string_lossy());
    }
}

#[test]
fn test_kind_tags_and_passthrough_metadata() {
    let temp = populated_root();
    let registry = ModelRegistry::scan(temp.path());

    let base = registry.get("MORTM4.1-SAX").expect("base model registered");
    assert_eq!(base.kind_tag, KindTag::Pretrained);
    assert_eq!(base.metadata["vocab_size"], 1024);

    let pro = registry.get("MORTM4.1Pro-SAX").expect("pro model registered");
    assert_eq!(pro.kind_tag, KindTag::Sft);

    assert!(registry.get("MORTM").is_none(), "lookup is exact, not by keyword");
}

#[test]
fn test_broken_folder_does_not_hide_others() {
    let temp = populated_root();
    let registry = ModelRegistry::scan(temp.path());

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.catalog_errors().len(), 1);

    let skipped = &registry.catalog_errors()[0];
    assert!(skipped.folder.ends_with("broken"));
    assert!(matches!(skipped.reason, CatalogEntryReason::Malformed(_)));
}

#[test]
fn test_try_scan_missing_root_is_ok() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let registry = ModelRegistry::try_scan(temp.path().join("missing")).expect("missing root is empty");
    assert!(registry.is_empty());
}
