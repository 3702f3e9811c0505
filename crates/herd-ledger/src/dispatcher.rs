//! Operation dispatcher
//!
//! Routes `(operation, args)` pairs from the transaction layer to the state
//! manager and renders results as response bytes:
//!
//! | result          | bytes                         |
//! |-----------------|-------------------------------|
//! | identifier      | UTF-8 id                      |
//! | payout          | decimal amount                |
//! | init            | empty                         |
//! | catalog / read  | raw stored bytes              |
//! | consistency     | JSON invariant report         |
//!
//! Failed queries answer with `{"Error":"<message>"}`; failed mutations with
//! the plain error message.

use crate::command::{is_query_operation, Command};
use crate::state::CatalogStateManager;
use herd_core::{HerdError, RandomEffects, StorageEffects};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A failed dispatch: the typed error plus the bytes returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct DispatchError {
    /// What went wrong
    pub error: HerdError,
    /// Response payload for the caller
    pub payload: Vec<u8>,
}

impl DispatchError {
    fn new(error: HerdError, query: bool) -> Self {
        let message = error.to_string();
        let payload = if query {
            serde_json::to_vec(&ErrorPayload { error: &message })
                .unwrap_or_else(|_| message.clone().into_bytes())
        } else {
            message.into_bytes()
        };
        Self { error, payload }
    }
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    #[serde(rename = "Error")]
    error: &'a str,
}

/// Entry point for ledger invocations.
pub struct Dispatcher<S, R> {
    manager: Arc<CatalogStateManager<S, R>>,
}

impl<S, R> Clone for Dispatcher<S, R> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<S, R> Dispatcher<S, R>
where
    S: StorageEffects,
    R: RandomEffects,
{
    /// Dispatcher over a shared state manager
    pub fn new(manager: Arc<CatalogStateManager<S, R>>) -> Self {
        Self { manager }
    }

    /// The state manager behind this dispatcher
    pub fn manager(&self) -> &CatalogStateManager<S, R> {
        &self.manager
    }

    /// Decode and run one operation.
    pub async fn dispatch(
        &self,
        operation: &str,
        args: &[String],
    ) -> std::result::Result<Vec<u8>, DispatchError> {
        let command = Command::parse(operation, args).map_err(|error| {
            warn!(operation, error = %error, "Rejected invocation");
            DispatchError::new(error, is_query_operation(operation))
        })?;
        self.execute(command).await
    }

    /// Run an already decoded command.
    pub async fn execute(&self, command: Command) -> std::result::Result<Vec<u8>, DispatchError> {
        let operation = command.operation();
        let query = command.is_query();
        debug!(operation, "Dispatching");

        let result = match command {
            Command::Init { seed } => self.manager.init(&seed).await.map(|()| Vec::new()),
            Command::RegisterOwner {
                first_name,
                last_name,
            } => self
                .manager
                .register_owner(&first_name, &last_name)
                .await
                .map(|id| id.to_string().into_bytes()),
            Command::RegisterCow {
                owner_id,
                sensor_id,
            } => self
                .manager
                .register_cow(&owner_id, &sensor_id)
                .await
                .map(|id| id.to_string().into_bytes()),
            Command::GeneratePolicy {
                cow_id,
                owner_id,
                premium,
                value,
            } => self
                .manager
                .generate_policy(&cow_id, &owner_id, premium, value)
                .await
                .map(|id| id.to_string().into_bytes()),
            Command::SensorTriggered { sensor_id } => self
                .manager
                .sensor_triggered(&sensor_id)
                .await
                .map(|payout| payout.amount.to_string().into_bytes()),
            Command::GetAll(kind) => self.manager.get_all(kind).await,
            Command::Read { key } => self.manager.read(&key).await,
            Command::CheckConsistency => {
                self.manager
                    .check_consistency()
                    .await
                    .and_then(|report| {
                        serde_json::to_vec(&report).map_err(|e| {
                            HerdError::serialization(format!(
                                "Failed to encode consistency report: {e}"
                            ))
                        })
                    })
            }
        };

        result.map_err(|error| {
            warn!(operation, code = error.code(), error = %error, "Operation failed");
            DispatchError::new(error, query)
        })
    }
}
