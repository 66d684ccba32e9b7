//! Integration tests for the on-disk store
//!
//! Exercises the store both directly and behind the loader's compilation cache.

use std::sync::Arc;

use dynmod_loader::{CacheStore, CompilationArtifact, CompilationCache, LoadError};
use dynmod_store::{DiskStore, MemoryStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_set_then_get() {
    let temp_dir = TempDir::new().unwrap();
    let store = DiskStore::open(temp_dir.path()).unwrap();

    store.set("0123abcd", "{\"code\":1}".to_string()).await;

    assert_eq!(store.get("0123abcd").await.as_deref(), Some("{\"code\":1}"));
    assert!(store.contains("0123abcd"));
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_overwrite_replaces_entry() {
    let temp_dir = TempDir::new().unwrap();
    let store = DiskStore::open(temp_dir.path()).unwrap();

    store.set("beef", "old".to_string()).await;
    store.set("beef", "new".to_string()).await;

    assert_eq!(store.get("beef").await.as_deref(), Some("new"));
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_key_is_a_miss() {
    let temp_dir = TempDir::new().unwrap();
    let store = DiskStore::open(temp_dir.path()).unwrap();

    store.set("not-hex", "x".to_string()).await;
    assert!(store.get("not-hex").await.is_none());
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_entries_persist_across_instances() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = DiskStore::open(temp_dir.path()).unwrap();
        store.set("aa11", "kept".to_string()).await;
    }

    let reopened = DiskStore::open(temp_dir.path()).unwrap();
    assert_eq!(reopened.get("aa11").await.as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_clear_removes_entries() {
    let temp_dir = TempDir::new().unwrap();
    let store = DiskStore::open(temp_dir.path()).unwrap();

    store.set("aa11", "one".to_string()).await;
    store.set("bb22", "two".to_string()).await;
    assert_eq!(store.len().unwrap(), 2);

    store.clear().unwrap();

    assert!(store.is_empty().unwrap());
    assert!(store.get("aa11").await.is_none());
    assert!(temp_dir.path().join("tmp").is_dir());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_same_key() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(DiskStore::open(temp_dir.path()).unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.set("cafe", "same".to_string()).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.get("cafe").await.as_deref(), Some("same"));
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_compilation_cache_over_disk() {
    let temp_dir = TempDir::new().unwrap();
    let parts = ["engine/1", "set x 1", "/a.js"];

    let first = CompilationCache::new(Some(Arc::new(DiskStore::open(temp_dir.path()).unwrap())));
    let artifact: CompilationArtifact = first
        .get_or_compute(&parts, |_| async { Ok(CompilationArtifact::new(vec!["./b.js".to_string()], "code")) })
        .await
        .unwrap();
    assert_eq!(first.stats().stores, 1);

    let second = CompilationCache::new(Some(Arc::new(DiskStore::open(temp_dir.path()).unwrap())));
    let cached: CompilationArtifact = second
        .get_or_compute(&parts, |_| async {
            Err(LoadError::transform("/a.js", "producer ran on a cache hit", None))
        })
        .await
        .unwrap();

    assert_eq!(cached, artifact);
    assert_eq!(second.stats().hits, 1);
}

#[tokio::test]
async fn test_memory_store_behind_compilation_cache() {
    let store = Arc::new(MemoryStore::new());
    let cache = CompilationCache::new(Some(store.clone()));

    let value: String = cache
        .get_or_compute(&["k"], |persist| async move {
            persist.prevent_persist();
            Ok("volatile".to_string())
        })
        .await
        .unwrap();

    assert_eq!(value, "volatile");
    assert!(store.is_empty());
}
