//! # Herd Ledger - Catalog State and Lifecycle
//!
//! **Purpose**: Run every ledger operation against the catalogs held in
//! `herd-store`, keeping them consistent with each other.
//!
//! ```text
//! Dispatcher ──> Command ──> CatalogStateManager (RwLock gate)
//!                               ├── RegistrationService
//!                               ├── PolicyLifecycleService
//!                               └── QueryService
//! ```
//!
//! Multi-catalog writes go through an ordered commit plan. The store offers
//! no transactions, so a write failing midway is reported together with the
//! catalogs that already landed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Operation decoding
pub mod command;

/// Ordered multi-catalog commits
mod commit;

/// Ledger tunables
pub mod config;

/// Operation routing and response encoding
pub mod dispatcher;

/// Identifier allocation
pub mod ids;

/// Policy issue and death processing
pub mod lifecycle;

/// Read-only queries
pub mod query;

/// Owner and cow registration
pub mod registration;

/// Concurrency gate and service wiring
pub mod state;

pub use command::{is_query_operation, Command};
pub use config::LedgerConfig;
pub use dispatcher::{DispatchError, Dispatcher};
pub use ids::IdAllocator;
pub use lifecycle::{DeathStage, Payout, PolicyLifecycleService};
pub use query::QueryService;
pub use registration::RegistrationService;
pub use state::CatalogStateManager;
