//! Owner, cow and policy records as stored in the catalogs.

use crate::identifiers::{CowId, OwnerId, PolicyId, SensorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A registered livestock owner.
///
/// `cows_owned` and `policies` are projections of the cow and policy catalogs
/// filtered by this owner's id. The lifecycle services keep them in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Ledger-assigned identifier
    pub id: OwnerId,
    /// Given name, informational only
    #[serde(default)]
    pub first_name: String,
    /// Family name, informational only
    #[serde(default)]
    pub last_name: String,
    /// Live cows registered to this owner
    #[serde(default)]
    pub cows_owned: BTreeSet<CowId>,
    /// Live policies held by this owner
    #[serde(default)]
    pub policies: BTreeSet<PolicyId>,
}

impl Owner {
    /// Create an owner with no cows or policies.
    pub fn new(id: OwnerId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            cows_owned: BTreeSet::new(),
            policies: BTreeSet::new(),
        }
    }
}

/// A cow bound to exactly one sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cow {
    /// Ledger-assigned identifier
    pub id: CowId,
    /// Owner the cow is registered to
    pub owner_id: OwnerId,
    /// Sensor reporting on this cow; unique among live cows
    pub sensor_id: SensorId,
}

impl Cow {
    /// Create a cow record.
    pub fn new(id: CowId, owner_id: OwnerId, sensor_id: SensorId) -> Self {
        Self {
            id,
            owner_id,
            sensor_id,
        }
    }
}

/// An insurance policy covering one live cow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Ledger-assigned identifier
    pub id: PolicyId,
    /// Covered cow
    pub cow_id: CowId,
    /// Policy holder
    pub owner_id: OwnerId,
    /// Premium amount (recorded, never billed here)
    pub premium: u64,
    /// Payout amount on the cow's death
    pub value: u64,
}

impl Policy {
    /// Create a policy record.
    pub fn new(id: PolicyId, cow_id: CowId, owner_id: OwnerId, premium: u64, value: u64) -> Self {
        Self {
            id,
            cow_id,
            owner_id,
            premium,
            value,
        }
    }
}
