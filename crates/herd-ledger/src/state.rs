//! Catalog state manager
//!
//! Single owner of the store handle, the entropy source and the concurrency
//! gate. Mutations take the gate exclusively for their whole
//! read-modify-write sequence; queries share it, so a query never observes a
//! multi-catalog update halfway applied.

use crate::commit::CommitPlan;
use crate::config::LedgerConfig;
use crate::ids::IdAllocator;
use crate::lifecycle::{Payout, PolicyLifecycleService};
use crate::query::QueryService;
use crate::registration::{require_non_blank, RegistrationService};
use herd_core::{
    Catalog, CatalogKind, Cow, CowId, InvariantReport, Owner, OwnerId, Policy, PolicyId,
    RandomEffects, Result, SensorId, StorageEffects,
};
use herd_store::CatalogStore;
use tokio::sync::RwLock;
use tracing::info;

/// Coordinates every catalog operation over one store.
pub struct CatalogStateManager<S, R> {
    store: CatalogStore<S>,
    random: R,
    gate: RwLock<()>,
    registration: RegistrationService,
    lifecycle: PolicyLifecycleService,
    queries: QueryService,
}

impl<S, R> CatalogStateManager<S, R>
where
    S: StorageEffects,
    R: RandomEffects,
{
    /// Build a manager over `storage`, drawing identifiers from `random`.
    pub fn new(storage: S, random: R, config: &LedgerConfig) -> Self {
        let ids = IdAllocator::new(config.max_id_attempts);
        Self {
            store: CatalogStore::new(storage),
            random,
            gate: RwLock::new(()),
            registration: RegistrationService::new(ids),
            lifecycle: PolicyLifecycleService::new(ids),
            queries: QueryService::new(),
        }
    }

    /// The underlying catalog store
    pub fn store(&self) -> &CatalogStore<S> {
        &self.store
    }

    /// Seed all three catalogs as empty. Running it again resets the ledger.
    pub async fn init(&self, seed: &str) -> Result<()> {
        require_non_blank("seed", seed)?;
        let _guard = self.gate.write().await;

        CommitPlan::new()
            .stage(&Catalog::<Owner>::new())?
            .stage(&Catalog::<Cow>::new())?
            .stage(&Catalog::<Policy>::new())?
            .apply(&self.store)
            .await?;

        info!(seed, catalogs = ?CatalogKind::ALL, "Ledger initialized");
        Ok(())
    }

    /// See [`RegistrationService::register_owner`].
    pub async fn register_owner(&self, first_name: &str, last_name: &str) -> Result<OwnerId> {
        let _guard = self.gate.write().await;
        self.registration
            .register_owner(&self.store, &self.random, first_name, last_name)
            .await
    }

    /// See [`RegistrationService::register_cow`].
    pub async fn register_cow(&self, owner_id: &OwnerId, sensor_id: &SensorId) -> Result<CowId> {
        let _guard = self.gate.write().await;
        self.registration
            .register_cow(&self.store, &self.random, owner_id, sensor_id)
            .await
    }

    /// See [`PolicyLifecycleService::generate_policy`].
    pub async fn generate_policy(
        &self,
        cow_id: &CowId,
        owner_id: &OwnerId,
        premium: u64,
        value: u64,
    ) -> Result<PolicyId> {
        let _guard = self.gate.write().await;
        self.lifecycle
            .generate_policy(&self.store, &self.random, cow_id, owner_id, premium, value)
            .await
    }

    /// See [`PolicyLifecycleService::sensor_triggered`].
    pub async fn sensor_triggered(&self, sensor_id: &SensorId) -> Result<Payout> {
        let _guard = self.gate.write().await;
        self.lifecycle.sensor_triggered(&self.store, sensor_id).await
    }

    /// Raw bytes of one catalog
    pub async fn get_all(&self, kind: CatalogKind) -> Result<Vec<u8>> {
        let _guard = self.gate.read().await;
        self.queries.get_all(&self.store, kind).await
    }

    /// Raw bytes under any store key
    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let _guard = self.gate.read().await;
        self.queries.read(&self.store, key).await
    }

    /// Invariant report over a consistent snapshot of all three catalogs
    pub async fn check_consistency(&self) -> Result<InvariantReport> {
        let _guard = self.gate.read().await;
        self.queries.check_consistency(&self.store).await
    }
}
