//! Filesystem handler tests
//!
//! Exercises the production handler through the catalog store adapter.

use assert_matches::assert_matches;
use herd_core::{Catalog, CatalogKind, Owner, OwnerId, StorageEffects, StorageError};
use herd_store::{CatalogStore, FilesystemStorageHandler};
use std::time::Duration;

#[tokio::test]
async fn missing_key_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let handler = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    assert!(handler.retrieve("_activeOwners").await.unwrap().is_none());
}

#[tokio::test]
async fn catalogs_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::from_entries(vec![Owner::new(OwnerId::new("O1"), "Jane", "Doe")]);

    {
        let handler = FilesystemStorageHandler::open(dir.path()).await.unwrap();
        let store = CatalogStore::new(handler);
        store.save(&catalog).await.unwrap();
    }

    let reopened = CatalogStore::new(FilesystemStorageHandler::open(dir.path()).await.unwrap());
    let loaded: Catalog<Owner> = reopened.load().await.unwrap();
    assert_eq!(loaded, catalog);

    let raw = reopened.get(CatalogKind::Owners).await.unwrap().unwrap();
    assert!(raw.starts_with(br#"{"owners":["#));
}

#[tokio::test]
async fn overwrite_leaves_no_staging_file() {
    let dir = tempfile::tempdir().unwrap();
    let handler = FilesystemStorageHandler::open(dir.path().join("state")).await.unwrap();

    handler.store("_activeCows", b"first".to_vec()).await.unwrap();
    handler.store("_activeCows", b"second".to_vec()).await.unwrap();

    assert_eq!(
        handler.retrieve("_activeCows").await.unwrap(),
        Some(b"second".to_vec())
    );
    let mut names: Vec<String> = std::fs::read_dir(handler.base_path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![".lock".to_string(), "_activeCows".to_string()]);
}

#[tokio::test]
async fn keys_with_separators_stay_inside_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    let handler = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    handler.store("../escape", b"x".to_vec()).await.unwrap();
    assert_eq!(handler.retrieve("../escape").await.unwrap(), Some(b"x".to_vec()));
    assert!(dir.path().join("%2E%2E%2Fescape").exists());
    assert!(!dir.path().parent().unwrap().join("escape").exists());
}

#[tokio::test]
async fn lookalike_keys_do_not_share_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let handler = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    handler.store("a/b", b"slash".to_vec()).await.unwrap();
    handler.store("a_b", b"underscore".to_vec()).await.unwrap();
    assert_eq!(handler.retrieve("a/b").await.unwrap(), Some(b"slash".to_vec()));
    assert_eq!(
        handler.retrieve("a_b").await.unwrap(),
        Some(b"underscore".to_vec())
    );
}

#[tokio::test]
async fn dot_keys_read_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let handler = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    for key in [".", "..", ".lock", ""] {
        assert!(handler.retrieve(key).await.unwrap().is_none(), "key {key:?}");
    }
    assert_matches!(
        handler.store("", b"x".to_vec()).await,
        Err(StorageError::WriteFailed(_))
    );
}

#[tokio::test]
async fn second_open_fails_fast_while_directory_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let first = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    assert_matches!(
        FilesystemStorageHandler::try_open(dir.path()).await,
        Err(StorageError::Unavailable(_))
    );

    let clone = first.clone();
    drop(first);
    assert_matches!(
        FilesystemStorageHandler::try_open(dir.path()).await,
        Err(StorageError::Unavailable(_))
    );

    drop(clone);
    assert!(FilesystemStorageHandler::try_open(dir.path()).await.is_ok());
}

#[tokio::test]
async fn open_waits_for_the_current_holder() {
    let dir = tempfile::tempdir().unwrap();
    let holder = FilesystemStorageHandler::open(dir.path()).await.unwrap();

    let path = dir.path().to_path_buf();
    let waiter = tokio::spawn(async move { FilesystemStorageHandler::open(path).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    drop(holder);
    let reopened = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .unwrap()
        .unwrap();
    assert!(reopened.is_ok());
}
