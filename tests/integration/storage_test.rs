//! File-backed local storage

use crate::common::{documents_for, temp_storage, RICHARD};
use crate::assert_ok;
use pretty_assertions::assert_eq;
use qualiflow::egui_app::local_db::keys;
use qualiflow::egui_app::LocalStorage;
use qualiflow::shared::{Document, Member};

#[tokio::test]
async fn test_values_survive_reopen() {
    let (dir, storage) = temp_storage().await;
    assert_ok!(storage.set_item(keys::AUTH_TOKEN, "token-1").await);
    assert_ok!(storage.set_json("documents", &documents_for(RICHARD, 3)).await);
    drop(storage);

    let reopened = assert_ok!(LocalStorage::open(&dir.path().join("qualiflow.db")).await);
    assert_eq!(
        assert_ok!(reopened.get_item(keys::AUTH_TOKEN).await).as_deref(),
        Some("token-1")
    );
    let docs: Vec<Document> = reopened.get_json("documents").await.unwrap();
    assert_eq!(docs, documents_for(RICHARD, 3));
    assert_eq!(assert_ok!(reopened.len().await), 2);
}

#[tokio::test]
async fn test_open_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("profiles").join("richard").join("qualiflow.db");

    let storage = assert_ok!(LocalStorage::open(&nested).await);
    assert!(nested.exists());
    assert!(assert_ok!(storage.is_empty().await));
}

#[tokio::test]
async fn test_malformed_cache_falls_back_to_default() {
    let (_dir, storage) = temp_storage().await;
    assert_ok!(storage.set_item(keys::MEMBRES, "[{\"id\": 1,").await);

    let members: Vec<Member> = storage.get_json_or(keys::MEMBRES, Vec::new()).await;
    assert!(members.is_empty());
}

#[tokio::test]
async fn test_clear_removes_session() {
    let (_dir, storage) = temp_storage().await;
    assert_ok!(storage.set_item(keys::AUTH_TOKEN, "token-1").await);
    assert_ok!(storage.set_item(keys::USER_ROLE, "admin").await);

    assert_ok!(storage.clear().await);
    assert_eq!(assert_ok!(storage.get_item(keys::AUTH_TOKEN).await), None);
    assert!(assert_ok!(storage.is_empty().await));
}
