//! Read-only queries over the catalogs.

use crate::registration::require_non_blank;
use herd_core::{
    check_catalogs, Catalog, CatalogKind, Cow, HerdError, InvariantReport, Owner, Policy, Result,
    StorageEffects,
};
use herd_store::CatalogStore;
use tracing::{debug, warn};

/// Serves catalog reads without decoding them.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryService;

impl QueryService {
    /// Create a query service
    pub fn new() -> Self {
        Self
    }

    /// Raw serialized catalog, byte-for-byte as stored.
    ///
    /// Unlike mutations, which treat an unseeded catalog as empty, a query
    /// against a catalog that was never written is `NotFound`.
    pub async fn get_all<S: StorageEffects>(
        &self,
        store: &CatalogStore<S>,
        kind: CatalogKind,
    ) -> Result<Vec<u8>> {
        let bytes = store.get(kind).await?.ok_or_else(|| {
            HerdError::not_found(format!(
                "catalog {} has not been initialized",
                kind.store_key()
            ))
        })?;
        debug!(catalog = %kind, size = bytes.len(), "Catalog read");
        Ok(bytes)
    }

    /// Raw state under any store key.
    pub async fn read<S: StorageEffects>(
        &self,
        store: &CatalogStore<S>,
        key: &str,
    ) -> Result<Vec<u8>> {
        require_non_blank("key", key)?;
        store
            .get_raw(key)
            .await?
            .ok_or_else(|| HerdError::not_found(format!("no state stored under {key}")))
    }

    /// Check every catalog invariant over the current snapshot.
    pub async fn check_consistency<S: StorageEffects>(
        &self,
        store: &CatalogStore<S>,
    ) -> Result<InvariantReport> {
        let owners: Catalog<Owner> = store.load().await?;
        let cows: Catalog<Cow> = store.load().await?;
        let policies: Catalog<Policy> = store.load().await?;

        let report = check_catalogs(&owners, &cows, &policies);
        if report.consistent {
            debug!(
                owners = owners.len(),
                cows = cows.len(),
                policies = policies.len(),
                "Catalogs consistent"
            );
        } else {
            warn!(
                violations = report.violations.len(),
                worst = ?report.worst(),
                "Catalog invariants violated"
            );
        }
        Ok(report)
    }
}
