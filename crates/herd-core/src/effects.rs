//! Core effect trait definitions
//!
//! Pure trait definitions for the side effects the ledger performs. This
//! module defines **what** effects exist; handlers in `herd-store` define
//! **how**. All catalog code is parameterized by these traits so tests can
//! swap in deterministic handlers.

use async_trait::async_trait;
use uuid::Uuid;

/// Failure reported by a storage handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Reading a key failed
    #[error("read failed: {0}")]
    ReadFailed(String),
    /// Writing a key failed
    #[error("write failed: {0}")]
    WriteFailed(String),
    /// The store is held by another user and cannot be opened
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value state store offering single-key atomicity only.
///
/// A completed `store` is the unit of visibility: readers see either the old
/// value or the full new value, never a partial write. There is no
/// multi-key transaction.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Read the value under `key`; `None` if the key was never written.
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Entropy source for identifier generation.
///
/// Implementations supply collision-resistant tokens, but uniqueness is only
/// probabilistic; callers still check candidates against live catalogs.
#[async_trait]
pub trait RandomEffects: Send + Sync {
    /// Draw a fresh UUID.
    async fn random_uuid(&self) -> Uuid;
}

#[async_trait]
impl<T: StorageEffects + ?Sized> StorageEffects for std::sync::Arc<T> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).retrieve(key).await
    }
}

#[async_trait]
impl<T: RandomEffects + ?Sized> RandomEffects for std::sync::Arc<T> {
    async fn random_uuid(&self) -> Uuid {
        (**self).random_uuid().await
    }
}
