//! Catalog store adapter
//!
//! Wraps a [`StorageEffects`] handler behind get/put operations keyed by the
//! fixed catalog names. Each `put` is independent: there are no multi-key
//! transactions, so callers writing several catalogs must order their writes
//! and report partial progress themselves.

use crate::codec::CatalogCodec;
use herd_core::{Catalog, CatalogEntry, CatalogKind, HerdError, Result, StorageEffects};
use tracing::{debug, warn};

/// Typed access to the three catalogs over a key-value store.
#[derive(Debug, Clone)]
pub struct CatalogStore<S> {
    storage: S,
    codec: CatalogCodec,
}

impl<S: StorageEffects> CatalogStore<S> {
    /// Wrap a storage handler
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            codec: CatalogCodec::new(),
        }
    }

    /// Borrow the underlying storage handler
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Raw bytes of a catalog; `None` if the key was never written.
    pub async fn get(&self, kind: CatalogKind) -> Result<Option<Vec<u8>>> {
        self.get_raw(kind.store_key()).await
    }

    /// Replace a catalog's raw bytes.
    pub async fn put(&self, kind: CatalogKind, bytes: Vec<u8>) -> Result<()> {
        let key = kind.store_key();
        let size = bytes.len();
        self.storage.store(key, bytes).await.map_err(|e| {
            warn!(key, error = %e, "Catalog write failed");
            HerdError::store(format!("Failed to write {key}: {e}"))
        })?;
        debug!(key, size, "Catalog written");
        Ok(())
    }

    /// Raw bytes under an arbitrary store key.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage
            .retrieve(key)
            .await
            .map_err(|e| HerdError::store(format!("Failed to read {key}: {e}")))
    }

    /// Load and decode a catalog. A key that was never written loads as empty.
    pub async fn load<T: CatalogEntry>(&self) -> Result<Catalog<T>> {
        match self.get(T::KIND).await? {
            Some(bytes) => self.codec.decode(&bytes),
            None => {
                debug!(catalog = %T::KIND, "Catalog key not seeded; treating as empty");
                Ok(Catalog::new())
            }
        }
    }

    /// Encode and persist a catalog.
    pub async fn save<T: CatalogEntry>(&self, catalog: &Catalog<T>) -> Result<()> {
        let bytes = self.codec.encode(catalog)?;
        self.put(T::KIND, bytes).await
    }
}
