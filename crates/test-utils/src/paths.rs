//! Locating real input data for optional tests.
//!
//! The WorldClim raster, the GADM boundary and the bear CSV are large and
//! not checked in.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// First existing `name` under `$TEST_DATA_DIR`, `<root>/data`,
/// `<root>/../data` (the CLI default layout) or `<root>/testdata`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.push(root.join("data").join(name));
    if let Some(parent) = root.parent() {
        candidates.push(parent.join("data").join(name));
    }
    candidates.push(root.join("testdata").join(name));

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_holds_manifest() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "{:?}", root);
    }

    #[test]
    fn test_missing_file_is_none() {
        assert_eq!(find_test_file("definitely_not_here_1234.tif"), None);
    }
}
