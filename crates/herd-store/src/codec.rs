//! Catalog codec
//!
//! Catalogs are persisted as a JSON object with a single envelope field
//! holding the ordered entity array, e.g. `{"cows":[{...},{...}]}`. Entity
//! fields serialize in declaration order, so encoding is deterministic and
//! re-encoding decoded bytes reproduces them exactly.

use herd_core::{Catalog, CatalogEntry, HerdError, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializes catalogs to and from their stored byte form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogCodec;

struct Envelope<'a, T> {
    field: &'static str,
    entries: &'a [T],
}

impl<T: Serialize> Serialize for Envelope<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, self.entries)?;
        map.end()
    }
}

impl CatalogCodec {
    /// Create a codec
    pub fn new() -> Self {
        Self
    }

    /// Encode a catalog to bytes.
    pub fn encode<T: CatalogEntry>(&self, catalog: &Catalog<T>) -> Result<Vec<u8>> {
        let envelope = Envelope {
            field: T::KIND.envelope_field(),
            entries: catalog.entries(),
        };
        serde_json::to_vec(&envelope).map_err(|e| {
            HerdError::serialization(format!("Failed to encode {} catalog: {e}", T::KIND))
        })
    }

    /// Decode catalog bytes.
    ///
    /// Empty input decodes to an empty catalog.
    pub fn decode<T: CatalogEntry>(&self, bytes: &[u8]) -> Result<Catalog<T>> {
        if bytes.is_empty() {
            return Ok(Catalog::new());
        }

        let field = T::KIND.envelope_field();
        let mut envelope: BTreeMap<String, Vec<T>> = serde_json::from_slice(bytes).map_err(|e| {
            HerdError::serialization(format!("Malformed {} catalog: {e}", T::KIND))
        })?;

        let entries = envelope.remove(field).ok_or_else(|| {
            HerdError::serialization(format!("{} catalog is missing the \"{field}\" field", T::KIND))
        })?;
        if let Some(unexpected) = envelope.keys().next() {
            return Err(HerdError::serialization(format!(
                "{} catalog has unexpected field \"{unexpected}\"",
                T::KIND
            )));
        }

        Ok(Catalog::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use herd_core::{Cow, CowId, Owner, OwnerId, Policy, PolicyId, SensorId};
    use proptest::prelude::*;

    fn cow(id: &str, sensor: &str) -> Cow {
        Cow::new(CowId::new(id), OwnerId::new("O1"), SensorId::new(sensor))
    }

    #[test]
    fn test_empty_bytes_decode_to_empty_catalog() {
        let catalog: Catalog<Cow> = CatalogCodec.decode(b"").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_encode_uses_envelope_field() {
        let catalog = Catalog::from_entries(vec![cow("C1", "S1")]);
        let bytes = CatalogCodec.encode(&catalog).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"cows":[{"id":"C1","ownerId":"O1","sensorId":"S1"}]}"#
        );

        let empty: Catalog<Owner> = Catalog::new();
        assert_eq!(CatalogCodec.encode(&empty).unwrap(), br#"{"owners":[]}"#.to_vec());
    }

    #[test]
    fn test_decode_rejects_wrong_envelope() {
        let result: Result<Catalog<Cow>> = CatalogCodec.decode(br#"{"owners":[]}"#);
        assert_matches!(result, Err(HerdError::Serialization { .. }));
    }

    #[test]
    fn test_decode_rejects_extra_fields() {
        let result: Result<Catalog<Policy>> =
            CatalogCodec.decode(br#"{"policies":[],"pending":[]}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_decode_owners_without_names() {
        let catalog: Catalog<Owner> = CatalogCodec
            .decode(br#"{"owners":[{"id":"O1","cowsOwned":[],"policies":[]}]}"#)
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains(&OwnerId::new("O1")));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<Catalog<Owner>> = CatalogCodec.decode(b"{\"owners\": [");
        assert_matches!(result, Err(HerdError::Serialization { .. }));
    }

    fn arb_policy() -> impl Strategy<Value = Policy> {
        ("[a-f0-9]{8}", "[a-f0-9]{8}", "[a-z]{1,6}", any::<u64>(), any::<u64>()).prop_map(
            |(id, cow_id, owner, premium, value)| {
                Policy::new(
                    PolicyId::new(id),
                    CowId::new(cow_id),
                    OwnerId::new(owner),
                    premium,
                    value,
                )
            },
        )
    }

    proptest! {
        #[test]
        fn prop_decode_encode_preserves_entries_and_bytes(
            policies in proptest::collection::vec(arb_policy(), 0..16)
        ) {
            let catalog = Catalog::from_entries(policies);
            let bytes = CatalogCodec.encode(&catalog).unwrap();
            let decoded: Catalog<Policy> = CatalogCodec.decode(&bytes).unwrap();
            prop_assert_eq!(&decoded, &catalog);
            prop_assert_eq!(CatalogCodec.encode(&decoded).unwrap(), bytes);
        }
    }
}
