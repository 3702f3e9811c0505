//! Unified error system for Herd
//!
//! Every ledger operation returns [`HerdError`]. All variants are recoverable
//! by the caller; none of them terminate the process.

use crate::catalog::CatalogKind;
use crate::effects::StorageError;
use serde::{Deserialize, Serialize};

/// Unified error type for all Herd operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum HerdError {
    /// Wrong arity or malformed argument
    #[error("Invalid argument: {message}")]
    Argument {
        /// Description of the offending argument
        message: String,
    },

    /// A referenced identifier is absent from its catalog
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found
        message: String,
    },

    /// A uniqueness or one-policy-per-cow rule would be violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting state
        message: String,
    },

    /// Stored catalog bytes are malformed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the decode or encode failure
        message: String,
    },

    /// The underlying store rejected a read or write
    #[error("Store error: {message}{}", committed_note(.committed))]
    Store {
        /// Description of the store failure
        message: String,
        /// Catalogs already written before the failure, in write order
        committed: Vec<CatalogKind>,
    },

    /// Operation name not recognized by the dispatcher
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// The rejected operation name
        name: String,
    },
}

fn committed_note(committed: &[CatalogKind]) -> String {
    if committed.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = committed.iter().map(|kind| kind.envelope_field()).collect();
    format!(
        " (already committed: {}; retry re-validates against the updated catalogs)",
        names.join(", ")
    )
}

impl HerdError {
    /// Create an argument error
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a store error with nothing committed
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            committed: Vec::new(),
        }
    }

    /// Create a store error raised after some catalogs were already written
    pub fn store_partial(message: impl Into<String>, committed: Vec<CatalogKind>) -> Self {
        Self::Store {
            message: message.into(),
            committed,
        }
    }

    /// Create an unknown operation error
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    /// Stable name of the error class, as reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Argument { .. } => "ArgumentError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Conflict { .. } => "ConflictError",
            Self::Serialization { .. } => "SerializationError",
            Self::Store { .. } => "StoreError",
            Self::UnknownOperation { .. } => "UnknownOperation",
        }
    }
}

/// Standard Result type for Herd operations
pub type Result<T> = std::result::Result<T, HerdError>;

impl From<StorageError> for HerdError {
    fn from(err: StorageError) -> Self {
        Self::store(err.to_string())
    }
}

impl From<serde_json::Error> for HerdError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
