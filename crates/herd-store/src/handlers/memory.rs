//! In-memory storage handler for testing

use async_trait::async_trait;
use herd_core::{StorageEffects, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage handler for testing
///
/// Clones share the same underlying map. Writes to keys registered with
/// [`fail_writes_to`](Self::fail_writes_to) are rejected, which lets tests
/// exercise partially committed multi-catalog updates.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageHandler {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing_writes: Arc<RwLock<HashSet<String>>>,
}

impl MemoryStorageHandler {
    /// Create a new memory storage handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent write to `key`
    pub async fn fail_writes_to(&self, key: &str) {
        self.failing_writes.write().await.insert(key.to_string());
    }

    /// Accept writes to every key again
    pub async fn heal(&self) {
        self.failing_writes.write().await.clear();
    }

    /// Current value under `key`, bypassing the effect interface
    pub async fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().await.get(key).cloned()
    }
}

#[async_trait]
impl StorageEffects for MemoryStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if self.failing_writes.read().await.contains(key) {
            return Err(StorageError::WriteFailed(format!(
                "injected failure for {key}"
            )));
        }
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }
}
