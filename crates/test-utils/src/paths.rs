//! Path utilities for test data trees.

use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates (if needed) and returns `root/<dataset>`.
pub fn dataset_dir(root: &Path, dataset: &str) -> PathBuf {
    let dir = root.join(dataset);
    std::fs::create_dir_all(&dir).expect("Failed to create dataset directory");
    dir
}

/// Number of entries directly inside `dir` (0 if it does not exist).
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}
