//! Cross-catalog invariant checking
//!
//! The store only guarantees single-key atomicity, so a crash between two
//! catalog writes can leave the catalogs disagreeing. These checks run over a
//! snapshot of all three catalogs and report every disagreement found.

use crate::catalog::{Catalog, CatalogKind};
use crate::entities::{Cow, Owner, Policy};
use crate::identifiers::{CowId, OwnerId, PolicyId, SensorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Severity of an invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Bookkeeping drift; payouts are unaffected
    Warning,
    /// An owner reference or an owner projection disagrees with the catalogs
    High,
    /// Referential or uniqueness rule broken; payouts may be wrong
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Types of invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InvariantViolation {
    /// Two live cows report through the same sensor
    DuplicateSensor {
        /// Shared sensor
        sensor_id: SensorId,
        /// Cows bound to it
        cows: Vec<CowId>,
    },
    /// A policy covers a cow that is not in the cow catalog
    DanglingPolicy {
        /// Offending policy
        policy_id: PolicyId,
        /// Missing cow
        cow_id: CowId,
    },
    /// A cow is covered by more than one policy
    MultiplePolicies {
        /// Covered cow
        cow_id: CowId,
        /// Policies covering it
        policies: Vec<PolicyId>,
    },
    /// A cow or policy names an owner that is not registered
    UnknownOwner {
        /// Catalog holding the referencing entity
        catalog: CatalogKind,
        /// Referencing entity
        entity_id: String,
        /// Missing owner
        owner_id: OwnerId,
    },
    /// A policy holder differs from the covered cow's owner
    PolicyOwnerMismatch {
        /// Offending policy
        policy_id: PolicyId,
        /// Owner recorded on the policy
        policy_owner: OwnerId,
        /// Owner recorded on the cow
        cow_owner: OwnerId,
    },
    /// An owner's projection set disagrees with a catalog
    OwnerProjectionMismatch {
        /// Owner whose set drifted
        owner_id: OwnerId,
        /// Catalog the set projects
        catalog: CatalogKind,
        /// Ids present in the catalog but missing from the owner's set
        missing: Vec<String>,
        /// Ids in the owner's set with no matching catalog entry
        extraneous: Vec<String>,
    },
    /// The same identifier appears twice in one catalog
    DuplicateId {
        /// Catalog containing the duplicate
        catalog: CatalogKind,
        /// Repeated identifier
        id: String,
    },
}

impl InvariantViolation {
    /// Severity of this violation
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateSensor { .. }
            | Self::DanglingPolicy { .. }
            | Self::MultiplePolicies { .. }
            | Self::DuplicateId { .. } => Severity::Critical,
            Self::UnknownOwner { .. } | Self::OwnerProjectionMismatch { .. } => Severity::High,
            Self::PolicyOwnerMismatch { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSensor { sensor_id, cows } => {
                write!(f, "sensor {sensor_id} is bound to {} live cows", cows.len())
            }
            Self::DanglingPolicy { policy_id, cow_id } => {
                write!(f, "policy {policy_id} covers missing cow {cow_id}")
            }
            Self::MultiplePolicies { cow_id, policies } => {
                write!(f, "cow {cow_id} is covered by {} policies", policies.len())
            }
            Self::UnknownOwner {
                catalog,
                entity_id,
                owner_id,
            } => write!(
                f,
                "{catalog} entry {entity_id} references unregistered owner {owner_id}"
            ),
            Self::PolicyOwnerMismatch {
                policy_id,
                policy_owner,
                cow_owner,
            } => write!(
                f,
                "policy {policy_id} is held by {policy_owner} but its cow belongs to {cow_owner}"
            ),
            Self::OwnerProjectionMismatch {
                owner_id,
                catalog,
                missing,
                extraneous,
            } => write!(
                f,
                "owner {owner_id} {catalog} set drifted: missing [{}], extraneous [{}]",
                missing.join(", "),
                extraneous.join(", ")
            ),
            Self::DuplicateId { catalog, id } => {
                write!(f, "id {id} appears more than once in {catalog}")
            }
        }
    }
}

/// Result of checking a catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    /// Whether no violation was found
    pub consistent: bool,
    /// Every violation found, most severe first
    pub violations: Vec<InvariantViolation>,
}

impl InvariantReport {
    fn from_violations(mut violations: Vec<InvariantViolation>) -> Self {
        violations.sort_by_key(|v| std::cmp::Reverse(v.severity()));
        Self {
            consistent: violations.is_empty(),
            violations,
        }
    }

    /// Highest severity present, if any
    pub fn worst(&self) -> Option<Severity> {
        self.violations.iter().map(InvariantViolation::severity).max()
    }
}

/// Check all catalog invariants over one snapshot.
pub fn check_catalogs(
    owners: &Catalog<Owner>,
    cows: &Catalog<Cow>,
    policies: &Catalog<Policy>,
) -> InvariantReport {
    let mut violations = Vec::new();

    duplicate_ids(CatalogKind::Owners, owners.iter().map(|o| o.id.as_str()), &mut violations);
    duplicate_ids(CatalogKind::Cows, cows.iter().map(|c| c.id.as_str()), &mut violations);
    duplicate_ids(
        CatalogKind::Policies,
        policies.iter().map(|p| p.id.as_str()),
        &mut violations,
    );

    let mut by_sensor: BTreeMap<&SensorId, Vec<CowId>> = BTreeMap::new();
    for cow in cows {
        by_sensor.entry(&cow.sensor_id).or_default().push(cow.id.clone());
        if !owners.contains(&cow.owner_id) {
            violations.push(InvariantViolation::UnknownOwner {
                catalog: CatalogKind::Cows,
                entity_id: cow.id.to_string(),
                owner_id: cow.owner_id.clone(),
            });
        }
    }
    for (sensor_id, bound) in by_sensor {
        if bound.len() > 1 {
            violations.push(InvariantViolation::DuplicateSensor {
                sensor_id: sensor_id.clone(),
                cows: bound,
            });
        }
    }

    let mut by_cow: BTreeMap<&CowId, Vec<PolicyId>> = BTreeMap::new();
    for policy in policies {
        by_cow.entry(&policy.cow_id).or_default().push(policy.id.clone());
        match cows.get(&policy.cow_id) {
            None => violations.push(InvariantViolation::DanglingPolicy {
                policy_id: policy.id.clone(),
                cow_id: policy.cow_id.clone(),
            }),
            Some(cow) if cow.owner_id != policy.owner_id => {
                violations.push(InvariantViolation::PolicyOwnerMismatch {
                    policy_id: policy.id.clone(),
                    policy_owner: policy.owner_id.clone(),
                    cow_owner: cow.owner_id.clone(),
                });
            }
            Some(_) => {}
        }
        if !owners.contains(&policy.owner_id) {
            violations.push(InvariantViolation::UnknownOwner {
                catalog: CatalogKind::Policies,
                entity_id: policy.id.to_string(),
                owner_id: policy.owner_id.clone(),
            });
        }
    }
    for (cow_id, covering) in by_cow {
        if covering.len() > 1 {
            violations.push(InvariantViolation::MultiplePolicies {
                cow_id: cow_id.clone(),
                policies: covering,
            });
        }
    }

    for owner in owners {
        let expected_cows: BTreeSet<&CowId> = cows
            .iter()
            .filter(|c| c.owner_id == owner.id)
            .map(|c| &c.id)
            .collect();
        let recorded_cows: BTreeSet<&CowId> = owner.cows_owned.iter().collect();
        projection_drift(
            &owner.id,
            CatalogKind::Cows,
            &expected_cows,
            &recorded_cows,
            &mut violations,
        );

        let expected_policies: BTreeSet<&PolicyId> = policies
            .iter()
            .filter(|p| p.owner_id == owner.id)
            .map(|p| &p.id)
            .collect();
        let recorded_policies: BTreeSet<&PolicyId> = owner.policies.iter().collect();
        projection_drift(
            &owner.id,
            CatalogKind::Policies,
            &expected_policies,
            &recorded_policies,
            &mut violations,
        );
    }

    InvariantReport::from_violations(violations)
}

fn duplicate_ids<'a>(
    catalog: CatalogKind,
    ids: impl Iterator<Item = &'a str>,
    violations: &mut Vec<InvariantViolation>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            violations.push(InvariantViolation::DuplicateId {
                catalog,
                id: id.to_string(),
            });
        }
    }
}

fn projection_drift<I: Ord + fmt::Display>(
    owner_id: &OwnerId,
    catalog: CatalogKind,
    expected: &BTreeSet<&I>,
    recorded: &BTreeSet<&I>,
    violations: &mut Vec<InvariantViolation>,
) {
    let missing: Vec<String> = expected.difference(recorded).map(|id| id.to_string()).collect();
    let extraneous: Vec<String> = recorded.difference(expected).map(|id| id.to_string()).collect();
    if !missing.is_empty() || !extraneous.is_empty() {
        violations.push(InvariantViolation::OwnerProjectionMismatch {
            owner_id: owner_id.clone(),
            catalog,
            missing,
            extraneous,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consistent_snapshot() -> (Catalog<Owner>, Catalog<Cow>, Catalog<Policy>) {
        let mut owner = Owner::new(OwnerId::new("O1"), "Jane", "Doe");
        owner.cows_owned.insert(CowId::new("C1"));
        owner.policies.insert(PolicyId::new("P1"));

        let cow = Cow::new(CowId::new("C1"), OwnerId::new("O1"), SensorId::new("S1"));
        let policy = Policy::new(
            PolicyId::new("P1"),
            CowId::new("C1"),
            OwnerId::new("O1"),
            100,
            5000,
        );

        (
            Catalog::from_entries(vec![owner]),
            Catalog::from_entries(vec![cow]),
            Catalog::from_entries(vec![policy]),
        )
    }

    #[test]
    fn test_consistent_snapshot_passes() {
        let (owners, cows, policies) = consistent_snapshot();
        let report = check_catalogs(&owners, &cows, &policies);
        assert!(report.consistent);
        assert!(report.worst().is_none());
    }

    #[test]
    fn test_half_applied_death_is_reported() {
        // Cow catalog written, policy and owner catalogs not.
        let (owners, _, policies) = consistent_snapshot();
        let report = check_catalogs(&owners, &Catalog::new(), &policies);

        assert!(!report.consistent);
        assert_eq!(report.worst(), Some(Severity::Critical));
        assert!(report.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::DanglingPolicy { cow_id, .. } if cow_id.as_str() == "C1"
        )));
        assert!(report.violations.iter().any(|v| matches!(
            v,
            InvariantViolation::OwnerProjectionMismatch { catalog: CatalogKind::Cows, extraneous, .. }
                if extraneous == &vec!["C1".to_string()]
        )));
    }

    #[test]
    fn test_duplicate_sensor_reported_once() {
        let (owners, mut cows, policies) = consistent_snapshot();
        cows.push(Cow::new(
            CowId::new("C2"),
            OwnerId::new("O1"),
            SensorId::new("S1"),
        ));

        let report = check_catalogs(&owners, &cows, &policies);
        let duplicates: Vec<_> = report
            .violations
            .iter()
            .filter(|v| matches!(v, InvariantViolation::DuplicateSensor { .. }))
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].to_string().contains("sensor S1"));
    }

    #[test]
    fn test_report_serializes_with_type_tags() {
        let (owners, cows, _) = consistent_snapshot();
        let report = check_catalogs(&owners, &cows, &Catalog::new());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"consistent\":false"));
        assert!(json.contains("\"type\":\"ownerProjectionMismatch\""));
    }
}
