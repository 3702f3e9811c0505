//! Ledger property tests
//!
//! One test per externally observable guarantee of the ledger.

mod common;

use assert_matches::assert_matches;
use common::Ledger;
use herd_core::{Catalog, CatalogKind, Cow, HerdError, Owner, Policy};
use herd_store::CatalogCodec;

#[tokio::test]
async fn registered_cow_appears_exactly_once() {
    let ledger = Ledger::seeded().await;
    let owner = ledger.invoke_ok("registerOwner", &["Jane", "Doe"]).await;
    ledger.invoke_ok("registerCow", &[&owner, "S1"]).await;

    let cows = ledger.json("getActiveCows").await;
    let matching: Vec<_> = cows["cows"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|cow| cow["sensorId"] == "S1" && cow["ownerId"] == owner.as_str())
        .collect();
    assert_eq!(matching.len(), 1);
}

#[tokio::test]
async fn duplicate_sensor_is_conflict() {
    let ledger = Ledger::seeded().await;
    let first_owner = ledger.invoke_ok("registerOwner", &["Jane", "Doe"]).await;
    let second_owner = ledger.invoke_ok("registerOwner", &["John", "Roe"]).await;
    let first_cow = ledger.invoke_ok("registerCow", &[&first_owner, "S1"]).await;

    let err = ledger
        .invoke("registerCow", &[&second_owner, "S1"])
        .await
        .unwrap_err();
    assert_matches!(err.error, HerdError::Conflict { .. });

    let cows = ledger.json("getActiveCows").await;
    let cows = cows["cows"].as_array().unwrap();
    assert_eq!(cows.len(), 1);
    assert_eq!(cows[0]["id"], first_cow.as_str());
}

#[tokio::test]
async fn policy_for_missing_cow_is_not_found() {
    let ledger = Ledger::seeded().await;
    let owner = ledger.invoke_ok("registerOwner", &["Jane", "Doe"]).await;
    let before = ledger.invoke_ok("getActivePolicies", &[]).await;

    let err = ledger
        .invoke("generatePolicy", &["no-such-cow", &owner, "100", "5000"])
        .await
        .unwrap_err();
    assert_matches!(err.error, HerdError::NotFound { .. });
    assert_eq!(ledger.invoke_ok("getActivePolicies", &[]).await, before);
}

#[tokio::test]
async fn unknown_sensor_leaves_catalogs_untouched() {
    let ledger = Ledger::seeded().await;
    ledger.insured_cow("S1", 5000).await;
    let cows_before = ledger.invoke_ok("getActiveCows", &[]).await;
    let policies_before = ledger.invoke_ok("getActivePolicies", &[]).await;

    let err = ledger
        .invoke("sensorTriggered", &["S404"])
        .await
        .unwrap_err();
    assert_matches!(err.error, HerdError::NotFound { .. });

    assert_eq!(ledger.invoke_ok("getActiveCows", &[]).await, cows_before);
    assert_eq!(
        ledger.invoke_ok("getActivePolicies", &[]).await,
        policies_before
    );
}

#[tokio::test]
async fn end_to_end_death_pays_full_value() {
    let ledger = Ledger::seeded().await;
    let owner = ledger.invoke_ok("registerOwner", &["Jane", "Doe"]).await;
    let cow = ledger.invoke_ok("registerCow", &[&owner, "S1"]).await;
    let policy = ledger
        .invoke_ok("generatePolicy", &[&cow, &owner, "100", "5000"])
        .await;

    assert_eq!(ledger.invoke_ok("sensorTriggered", &["S1"]).await, "5000");

    let cows = ledger.json("getActiveCows").await;
    assert!(cows["cows"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["sensorId"] != "S1"));
    let policies = ledger.json("getActivePolicies").await;
    assert!(policies["policies"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["id"] != policy.as_str()));
}

#[tokio::test]
async fn repeated_reads_are_byte_identical() {
    let ledger = Ledger::seeded().await;
    ledger.insured_cow("S1", 5000).await;

    let first = ledger.invoke_ok("getActiveOwners", &[]).await;
    let second = ledger.invoke_ok("getActiveOwners", &[]).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn stored_catalogs_reencode_identically() {
    let ledger = Ledger::seeded().await;
    ledger.insured_cow("S1", 5000).await;
    ledger.insured_cow("S2", 7000).await;
    let codec = CatalogCodec::new();

    let owners = ledger.invoke_ok("getActiveOwners", &[]).await.into_bytes();
    let decoded: Catalog<Owner> = codec.decode(&owners).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(codec.encode(&decoded).unwrap(), owners);

    let cows = ledger.invoke_ok("getActiveCows", &[]).await.into_bytes();
    let decoded: Catalog<Cow> = codec.decode(&cows).unwrap();
    assert_eq!(codec.encode(&decoded).unwrap(), cows);

    let policies = ledger.invoke_ok("getActivePolicies", &[]).await.into_bytes();
    let decoded: Catalog<Policy> = codec.decode(&policies).unwrap();
    assert_eq!(codec.encode(&decoded).unwrap(), policies);
}

#[tokio::test]
async fn read_serves_catalog_keys() {
    let ledger = Ledger::seeded().await;
    ledger.insured_cow("S1", 5000).await;

    let via_read = ledger
        .invoke_ok("read", &[CatalogKind::Policies.store_key()])
        .await;
    assert_eq!(via_read, ledger.invoke_ok("getActivePolicies", &[]).await);

    let err = ledger.invoke("read", &["_nothing"]).await.unwrap_err();
    let payload: serde_json::Value = serde_json::from_slice(&err.payload).unwrap();
    assert!(payload.get("Error").is_some());
}
