//! Strongly typed identifiers.
//!
//! Entity identifiers are opaque strings. Ledger-assigned ids are rendered
//! from UUIDs, but lookups accept any caller-supplied string so an unknown id
//! surfaces as "not found" rather than as a parse failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from its string form.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

/// Identifiers the ledger assigns itself when an entity is created.
pub trait LedgerIdentifier: Clone + Eq + fmt::Display {
    /// Render an identifier from a freshly drawn UUID.
    fn from_uuid(uuid: Uuid) -> Self;
}

macro_rules! ledger_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        string_identifier!($(#[$meta])* $name);

        impl LedgerIdentifier for $name {
            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid.hyphenated().to_string())
            }
        }
    };
}

ledger_identifier!(
    /// Identifier of a registered owner.
    OwnerId
);

ledger_identifier!(
    /// Identifier of a registered cow.
    CowId
);

ledger_identifier!(
    /// Identifier of an insurance policy.
    PolicyId
);

string_identifier!(
    /// Identifier of the IoT sensor attached to a cow.
    ///
    /// Sensor ids are supplied by the device fleet, never generated here.
    SensorId
);
