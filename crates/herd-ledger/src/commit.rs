//! Ordered multi-catalog writes
//!
//! The store has no multi-key transaction. A [`CommitPlan`] encodes every
//! catalog up front, so an encoding failure aborts before anything is
//! written, then writes them in the staged order and reports which catalogs
//! landed if a later write fails.

use herd_core::{Catalog, CatalogEntry, CatalogKind, HerdError, Result, StorageEffects};
use herd_store::{CatalogCodec, CatalogStore};
use tracing::{debug, error};

/// Catalogs staged for writing, in write order.
#[derive(Debug, Default)]
pub(crate) struct CommitPlan {
    staged: Vec<(CatalogKind, Vec<u8>)>,
}

impl CommitPlan {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Encode `catalog` and queue it after everything staged so far.
    pub(crate) fn stage<T: CatalogEntry>(mut self, catalog: &Catalog<T>) -> Result<Self> {
        let bytes = CatalogCodec::new().encode(catalog)?;
        self.staged.push((T::KIND, bytes));
        Ok(self)
    }

    /// Write every staged catalog in order.
    ///
    /// A failure on the first write leaves the store untouched and is returned
    /// as-is. A failure after that carries the list of catalogs already
    /// written.
    pub(crate) async fn apply<S: StorageEffects>(self, store: &CatalogStore<S>) -> Result<()> {
        let mut committed = Vec::with_capacity(self.staged.len());
        for (kind, bytes) in self.staged {
            if let Err(err) = store.put(kind, bytes).await {
                if committed.is_empty() {
                    return Err(err);
                }
                error!(
                    failed = %kind,
                    committed = ?committed,
                    "Catalog write failed after earlier catalogs were committed"
                );
                let message = match err {
                    HerdError::Store { message, .. } => message,
                    other => other.to_string(),
                };
                return Err(HerdError::store_partial(message, committed));
            }
            committed.push(kind);
        }
        debug!(catalogs = ?committed, "Commit plan applied");
        Ok(())
    }
}
