//! Shared fixtures for ledger integration tests
#![allow(dead_code)]

use herd_ledger::{CatalogStateManager, DispatchError, Dispatcher, LedgerConfig};
use herd_store::{MemoryStorageHandler, SequentialRandomHandler};
use std::sync::Arc;

pub type TestDispatcher = Dispatcher<MemoryStorageHandler, SequentialRandomHandler>;

/// A dispatcher over in-memory storage, plus a handle on that storage for
/// fault injection and raw inspection.
pub struct Ledger {
    pub dispatcher: TestDispatcher,
    pub storage: MemoryStorageHandler,
}

impl Ledger {
    /// Fresh ledger, already initialized
    pub async fn seeded() -> Self {
        let ledger = Self::unseeded();
        ledger.invoke("init", &["1"]).await.unwrap();
        ledger
    }

    /// Fresh ledger with nothing written
    pub fn unseeded() -> Self {
        let storage = MemoryStorageHandler::new();
        let manager = CatalogStateManager::new(
            storage.clone(),
            SequentialRandomHandler::new(),
            &LedgerConfig::default(),
        );
        Self {
            dispatcher: Dispatcher::new(Arc::new(manager)),
            storage,
        }
    }

    pub async fn invoke(&self, operation: &str, args: &[&str]) -> Result<String, DispatchError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let bytes = self.dispatcher.dispatch(operation, &args).await?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    pub async fn invoke_ok(&self, operation: &str, args: &[&str]) -> String {
        match self.invoke(operation, args).await {
            Ok(response) => response,
            Err(err) => panic!("{operation} {args:?} failed: {err}"),
        }
    }

    pub async fn json(&self, operation: &str) -> serde_json::Value {
        serde_json::from_str(&self.invoke_ok(operation, &[]).await).unwrap()
    }

    /// Register Jane Doe with one insured cow on `sensor`.
    pub async fn insured_cow(&self, sensor: &str, value: u64) -> (String, String, String) {
        let owner = self.invoke_ok("registerOwner", &["Jane", "Doe"]).await;
        let cow = self.invoke_ok("registerCow", &[&owner, sensor]).await;
        let value = value.to_string();
        let policy = self
            .invoke_ok("generatePolicy", &[&cow, &owner, "100", &value])
            .await;
        (owner, cow, policy)
    }
}
