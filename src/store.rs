//! Workflow state store.
//!
//! The store is the single source of truth between stages and across process
//! boundaries: a key-value map of serialized workflow state with
//! last-writer-wins semantics. Controllers receive it as an injected
//! `Arc<dyn WorkflowStore>` so the backing engine can be swapped without
//! touching workflow code.
//!
//! `RunRegistry` enforces the at-most-one-concurrent-run guarantee per
//! workflow identifier.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Key-value persistence boundary for serialized workflow state
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Write a value under `key`, replacing any previous value
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Read the value under `key`, if present
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
}

/// In-process store backed by a concurrent map.
///
/// Retention is the store's responsibility; this implementation keeps entries
/// for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryStore {
    entries: DashMap<String, serde_json::Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}

/// Tracks which workflow identifiers currently have a `run()` in flight.
///
/// A second acquisition for the same identifier fails while the first guard
/// is alive; the caller surfaces that as a conflict. Different identifiers
/// never block each other.
#[derive(Clone, Default)]
pub struct RunRegistry {
    running: Arc<DashMap<String, ()>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim exclusive run rights for `key`. Returns `None` if a run for the
    /// same key is already in flight.
    pub fn acquire(&self, key: &str) -> Option<RunGuard> {
        match self.running.entry(key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(RunGuard {
                    running: Arc::clone(&self.running),
                    key: key.to_string(),
                })
            }
        }
    }
}

/// Releases the run claim on drop
pub struct RunGuard {
    running: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryStore::new();
        let value = serde_json::json!({"stage": "QUOTING", "amount": "10.00"});

        store.put("transfer_abc", value.clone()).await.unwrap();
        let loaded = store.get("transfer_abc").await.unwrap();
        assert_eq!(loaded, Some(value));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = InMemoryStore::new();
        store
            .put("k", serde_json::json!({"v": 1}))
            .await
            .unwrap();
        store
            .put("k", serde_json::json!({"v": 2}))
            .await
            .unwrap();
        assert_eq!(
            store.get("k").await.unwrap(),
            Some(serde_json::json!({"v": 2}))
        );
    }

    #[test]
    fn test_run_registry_exclusive() {
        let registry = RunRegistry::new();

        let guard = registry.acquire("id-1");
        assert!(guard.is_some());
        // Same id conflicts while the guard is alive
        assert!(registry.acquire("id-1").is_none());
        // Different ids never block each other
        assert!(registry.acquire("id-2").is_some());

        drop(guard);
        assert!(registry.acquire("id-1").is_some());
    }
}
