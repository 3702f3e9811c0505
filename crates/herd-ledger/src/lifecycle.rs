//! Policy lifecycle service
//!
//! Policies are created bound to a live cow and removed only when that cow
//! dies. The death path runs as a small state machine:
//!
//! ```text
//! Lookup -> CascadeDelete -> Payout -> Persisted
//! ```
//!
//! Every failure before `Persisted` aborts without writing. Writes go cows,
//! then policies, then owners: if the first write fails nothing changed and a
//! retry starts over; if it succeeded a retry fails `Lookup` with not-found
//! and the partial commit is visible in the returned store error.

use crate::commit::CommitPlan;
use crate::ids::IdAllocator;
use crate::registration::require_non_blank;
use herd_core::{
    Catalog, Cow, CowId, HerdError, Owner, OwnerId, Policy, PolicyId, RandomEffects, Result,
    SensorId, StorageEffects,
};
use herd_store::CatalogStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Stages of the death state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathStage {
    /// Find the cow reporting through the sensor
    Lookup,
    /// Remove the cow, its policy, and the owner's references to both
    CascadeDelete,
    /// Read the payout off the removed policy
    Payout,
    /// Write the updated catalogs back
    Persisted,
}

impl fmt::Display for DeathStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lookup => "lookup",
            Self::CascadeDelete => "cascade-delete",
            Self::Payout => "payout",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Outcome of a processed death event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    /// Cow removed from the catalog
    pub cow_id: CowId,
    /// Policy removed alongside it
    pub policy_id: PolicyId,
    /// Policy holder receiving the payout
    pub owner_id: OwnerId,
    /// The policy's full value; no proration
    pub amount: u64,
}

/// Creates policies and processes sensor-triggered deaths.
#[derive(Debug, Clone, Copy)]
pub struct PolicyLifecycleService {
    ids: IdAllocator,
}

impl PolicyLifecycleService {
    /// Create a lifecycle service
    pub fn new(ids: IdAllocator) -> Self {
        Self { ids }
    }

    /// Issue a policy for a live cow.
    ///
    /// # Errors
    /// * `NotFound` if the cow or the owner is not registered
    /// * `Argument` if `owner_id` does not own the cow
    /// * `Conflict` if the cow already has a policy
    pub async fn generate_policy<S, R>(
        &self,
        store: &CatalogStore<S>,
        random: &R,
        cow_id: &CowId,
        owner_id: &OwnerId,
        premium: u64,
        value: u64,
    ) -> Result<PolicyId>
    where
        S: StorageEffects,
        R: RandomEffects + ?Sized,
    {
        require_non_blank("cowId", cow_id.as_str())?;
        require_non_blank("ownerId", owner_id.as_str())?;

        let cows: Catalog<Cow> = store.load().await?;
        let cow = cows
            .get(cow_id)
            .ok_or_else(|| HerdError::not_found(format!("cow {cow_id} is not registered")))?;

        let mut owners: Catalog<Owner> = store.load().await?;
        if !owners.contains(owner_id) {
            return Err(HerdError::not_found(format!("owner {owner_id} is not registered")));
        }
        if &cow.owner_id != owner_id {
            return Err(HerdError::argument(format!(
                "cow {cow_id} belongs to owner {}, not {owner_id}",
                cow.owner_id
            )));
        }

        let mut policies: Catalog<Policy> = store.load().await?;
        if let Some(existing) = policies.find(|policy| &policy.cow_id == cow_id) {
            return Err(HerdError::conflict(format!(
                "cow {cow_id} is already covered by policy {}",
                existing.id
            )));
        }

        let policy_id = self.ids.allocate(random, &policies).await?;
        policies.push(Policy::new(
            policy_id.clone(),
            cow_id.clone(),
            owner_id.clone(),
            premium,
            value,
        ));
        if let Some(owner) = owners.get_mut(owner_id) {
            owner.policies.insert(policy_id.clone());
        }

        CommitPlan::new()
            .stage(&policies)?
            .stage(&owners)?
            .apply(store)
            .await?;

        info!(
            policy_id = %policy_id,
            cow_id = %cow_id,
            owner_id = %owner_id,
            premium,
            value,
            "Policy generated"
        );
        Ok(policy_id)
    }

    /// Process a death reported by `sensor_id` and return the payout.
    pub async fn sensor_triggered<S>(
        &self,
        store: &CatalogStore<S>,
        sensor_id: &SensorId,
    ) -> Result<Payout>
    where
        S: StorageEffects,
    {
        require_non_blank("sensorId", sensor_id.as_str())?;

        debug!(sensor_id = %sensor_id, stage = %DeathStage::Lookup, "Processing death event");
        let mut cows: Catalog<Cow> = store.load().await?;
        let cow = cows
            .remove_first(|cow| &cow.sensor_id == sensor_id)
            .ok_or_else(|| {
                HerdError::not_found(format!("no live cow is bound to sensor {sensor_id}"))
            })?;

        debug!(cow_id = %cow.id, stage = %DeathStage::CascadeDelete, "Processing death event");
        let mut policies: Catalog<Policy> = store.load().await?;
        let policy = policies
            .remove_first(|policy| policy.cow_id == cow.id)
            .ok_or_else(|| {
                HerdError::not_found(format!(
                    "cow {} has no policy; catalogs are inconsistent",
                    cow.id
                ))
            })?;

        let mut owners: Catalog<Owner> = store.load().await?;
        owners
            .get_mut(&cow.owner_id)
            .ok_or_else(|| missing_owner(&cow.owner_id, "cow", cow.id.as_str()))?
            .cows_owned
            .remove(&cow.id);
        owners
            .get_mut(&policy.owner_id)
            .ok_or_else(|| missing_owner(&policy.owner_id, "policy", policy.id.as_str()))?
            .policies
            .remove(&policy.id);

        debug!(policy_id = %policy.id, stage = %DeathStage::Payout, "Processing death event");
        let payout = Payout {
            cow_id: cow.id,
            policy_id: policy.id,
            owner_id: policy.owner_id,
            amount: policy.value,
        };

        CommitPlan::new()
            .stage(&cows)?
            .stage(&policies)?
            .stage(&owners)?
            .apply(store)
            .await?;

        info!(
            sensor_id = %sensor_id,
            cow_id = %payout.cow_id,
            policy_id = %payout.policy_id,
            owner_id = %payout.owner_id,
            amount = payout.amount,
            stage = %DeathStage::Persisted,
            "Death event settled"
        );
        Ok(payout)
    }
}

fn missing_owner(owner_id: &OwnerId, entity: &str, entity_id: &str) -> HerdError {
    HerdError::not_found(format!(
        "owner {owner_id} of {entity} {entity_id} is not registered; catalogs are inconsistent"
    ))
}
