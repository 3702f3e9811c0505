//! Registration service
//!
//! Creates owners and cows. Each method validates everything it can before
//! the first write, so a rejected registration never touches the store.

use crate::commit::CommitPlan;
use crate::ids::IdAllocator;
use herd_core::{
    Catalog, Cow, CowId, HerdError, Owner, OwnerId, RandomEffects, Result, SensorId,
    StorageEffects,
};
use herd_store::CatalogStore;
use tracing::info;

/// Creates owner and cow records.
///
/// Stateless apart from the id allocator; store and entropy are passed per
/// call.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationService {
    ids: IdAllocator,
}

impl RegistrationService {
    /// Create a registration service
    pub fn new(ids: IdAllocator) -> Self {
        Self { ids }
    }

    /// Register a new owner. Names are data, not identity: registering the
    /// same name twice yields two owners.
    pub async fn register_owner<S, R>(
        &self,
        store: &CatalogStore<S>,
        random: &R,
        first_name: &str,
        last_name: &str,
    ) -> Result<OwnerId>
    where
        S: StorageEffects,
        R: RandomEffects + ?Sized,
    {
        require_non_blank("firstName", first_name)?;
        require_non_blank("lastName", last_name)?;

        let mut owners: Catalog<Owner> = store.load().await?;
        let owner_id = self.ids.allocate(random, &owners).await?;
        owners.push(Owner::new(owner_id.clone(), first_name, last_name));

        CommitPlan::new().stage(&owners)?.apply(store).await?;

        info!(owner_id = %owner_id, owners = owners.len(), "Owner registered");
        Ok(owner_id)
    }

    /// Register a cow bound to `sensor_id` under an existing owner.
    pub async fn register_cow<S, R>(
        &self,
        store: &CatalogStore<S>,
        random: &R,
        owner_id: &OwnerId,
        sensor_id: &SensorId,
    ) -> Result<CowId>
    where
        S: StorageEffects,
        R: RandomEffects + ?Sized,
    {
        require_non_blank("ownerId", owner_id.as_str())?;
        require_non_blank("sensorId", sensor_id.as_str())?;

        let mut owners: Catalog<Owner> = store.load().await?;
        if !owners.contains(owner_id) {
            return Err(HerdError::not_found(format!("owner {owner_id} is not registered")));
        }

        let mut cows: Catalog<Cow> = store.load().await?;
        if let Some(existing) = cows.find(|cow| &cow.sensor_id == sensor_id) {
            return Err(HerdError::conflict(format!(
                "sensor {sensor_id} is already bound to cow {}",
                existing.id
            )));
        }

        let cow_id = self.ids.allocate(random, &cows).await?;
        cows.push(Cow::new(cow_id.clone(), owner_id.clone(), sensor_id.clone()));
        if let Some(owner) = owners.get_mut(owner_id) {
            owner.cows_owned.insert(cow_id.clone());
        }

        CommitPlan::new()
            .stage(&cows)?
            .stage(&owners)?
            .apply(store)
            .await?;

        info!(
            cow_id = %cow_id,
            owner_id = %owner_id,
            sensor_id = %sensor_id,
            "Cow registered"
        );
        Ok(cow_id)
    }
}

/// Reject empty or whitespace-only arguments.
pub(crate) fn require_non_blank(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HerdError::argument(format!("{name} must be a non-empty string")));
    }
    Ok(())
}
