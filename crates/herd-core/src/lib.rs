//! # Herd Core - Foundation Crate
//!
//! **Purpose**: Define the domain vocabulary shared by every Herd crate.
//!
//! The Herd ledger tracks three catalogs (owners, cows bound to sensors, and
//! insurance policies) and pays out a policy when a cow's sensor reports its
//! death. This crate holds the pieces every other layer agrees on.
//!
//! # Architecture Constraints
//!
//! - YES Identifier newtypes and entity records
//! - YES Ordered catalog container and catalog keys
//! - YES Unified error type
//! - YES Effect trait definitions (storage, randomness)
//! - YES Pure invariant checking over catalog snapshots
//! - NO effect handler implementations (that's `herd-store`)
//! - NO catalog mutation workflows (that's `herd-ledger`)
//!
//! ## What's NOT in this crate
//!
//! - Serialization of catalogs to store bytes (belongs in `herd-store::codec`)
//! - Locking and operation orchestration (belongs in `herd-ledger`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Ordered entity catalogs and their fixed store keys
pub mod catalog;

/// Effect traits for the external store and entropy source
pub mod effects;

/// Owner, cow and policy records
pub mod entities;

/// Unified error type
pub mod errors;

/// Strongly typed identifiers
pub mod identifiers;

/// Cross-catalog consistency checks
pub mod invariants;

pub use catalog::{Catalog, CatalogEntry, CatalogKind};
pub use effects::{RandomEffects, StorageEffects, StorageError};
pub use entities::{Cow, Owner, Policy};
pub use errors::{HerdError, Result};
pub use identifiers::{CowId, LedgerIdentifier, OwnerId, PolicyId, SensorId};
pub use invariants::{check_catalogs, InvariantReport, InvariantViolation, Severity};
