//! Ordered entity catalogs.
//!
//! Each catalog is persisted as a single blob under a fixed store key. The
//! store only offers single-key atomicity, so a catalog is the unit of both
//! reads and writes.

use crate::entities::{Cow, Owner, Policy};
use crate::identifiers::{CowId, LedgerIdentifier, OwnerId, PolicyId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Store key of the owner catalog.
pub const OWNERS_CATALOG_KEY: &str = "_activeOwners";
/// Store key of the cow catalog.
pub const COWS_CATALOG_KEY: &str = "_activeCows";
/// Store key of the policy catalog.
pub const POLICIES_CATALOG_KEY: &str = "_activePolicies";

/// The three catalogs tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogKind {
    /// Registered owners
    Owners,
    /// Live cows
    Cows,
    /// Active policies
    Policies,
}

impl CatalogKind {
    /// All catalogs in seeding order.
    pub const ALL: [CatalogKind; 3] = [Self::Owners, Self::Cows, Self::Policies];

    /// Fixed store key the catalog is persisted under.
    pub const fn store_key(self) -> &'static str {
        match self {
            Self::Owners => OWNERS_CATALOG_KEY,
            Self::Cows => COWS_CATALOG_KEY,
            Self::Policies => POLICIES_CATALOG_KEY,
        }
    }

    /// Name of the field wrapping the entity array in the serialized form.
    pub const fn envelope_field(self) -> &'static str {
        match self {
            Self::Owners => "owners",
            Self::Cows => "cows",
            Self::Policies => "policies",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.envelope_field())
    }
}

/// An entity kind that lives in a catalog.
pub trait CatalogEntry: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Identifier type of the entity
    type Id: LedgerIdentifier;

    /// Catalog holding entities of this kind
    const KIND: CatalogKind;

    /// Identifier of this entry.
    fn id(&self) -> &Self::Id;
}

impl CatalogEntry for Owner {
    type Id = OwnerId;
    const KIND: CatalogKind = CatalogKind::Owners;

    fn id(&self) -> &OwnerId {
        &self.id
    }
}

impl CatalogEntry for Cow {
    type Id = CowId;
    const KIND: CatalogKind = CatalogKind::Cows;

    fn id(&self) -> &CowId {
        &self.id
    }
}

impl CatalogEntry for Policy {
    type Id = PolicyId;
    const KIND: CatalogKind = CatalogKind::Policies;

    fn id(&self) -> &PolicyId {
        &self.id
    }
}

/// Ordered sequence of all live entities of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<T> {
    entries: Vec<T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from entries in their persisted order.
    pub fn from_entries(entries: Vec<T>) -> Self {
        Self { entries }
    }

    /// Kind of this catalog.
    pub fn kind(&self) -> CatalogKind {
        T::KIND
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Consume the catalog, returning its entries.
    pub fn into_entries(self) -> Vec<T> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Append an entry at the end of the catalog.
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Whether an entry with this id is present.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Look up an entry by id for in-place update.
    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    /// First entry matching a predicate.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.entries.iter().find(|&entry| predicate(entry))
    }

    /// Remove and return the first entry matching a predicate.
    ///
    /// Remaining entries keep their relative order.
    pub fn remove_first(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.entries.iter().position(|entry| predicate(entry))?;
        Some(self.entries.remove(index))
    }
}

impl<'a, T> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::SensorId;

    fn cow(n: u8) -> Cow {
        Cow::new(
            CowId::new(format!("C{n}")),
            OwnerId::new("O1"),
            SensorId::new(format!("S{n}")),
        )
    }

    #[test]
    fn test_remove_first_preserves_order() {
        let mut catalog = Catalog::from_entries((1..=5).map(cow).collect());

        let removed = catalog.remove_first(|c| c.sensor_id.as_str() == "S2");
        assert_eq!(removed.map(|c| c.id), Some(CowId::new("C2")));

        let remaining: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(remaining, vec!["C1", "C3", "C4", "C5"]);
    }

    #[test]
    fn test_remove_first_missing_leaves_catalog_untouched() {
        let mut catalog = Catalog::from_entries(vec![cow(1), cow(2)]);
        assert!(catalog.remove_first(|c| c.sensor_id.as_str() == "S9").is_none());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_get_by_id() {
        let catalog = Catalog::from_entries(vec![cow(1), cow(2)]);
        assert!(catalog.contains(&CowId::new("C2")));
        assert!(catalog.get(&CowId::new("C3")).is_none());
        assert_eq!(catalog.kind(), CatalogKind::Cows);
    }

    #[test]
    fn test_store_keys() {
        assert_eq!(CatalogKind::Owners.store_key(), "_activeOwners");
        assert_eq!(CatalogKind::Cows.store_key(), "_activeCows");
        assert_eq!(CatalogKind::Policies.store_key(), "_activePolicies");
        assert_eq!(CatalogKind::Policies.to_string(), "policies");
    }
}
