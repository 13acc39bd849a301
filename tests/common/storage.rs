//! File-backed local storage in a temporary directory

use qualiflow::egui_app::LocalStorage;
use tempfile::TempDir;

/// Open a storage file inside a fresh temp dir
///
/// Keep the `TempDir` alive for as long as the storage is used.
pub async fn temp_storage() -> (TempDir, LocalStorage) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let storage = LocalStorage::open(&dir.path().join("qualiflow.db"))
        .await
        .expect("open local storage");
    (dir, storage)
}
