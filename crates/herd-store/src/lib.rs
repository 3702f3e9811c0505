//! # Herd Store - Catalog Persistence
//!
//! **Purpose**: Move catalogs between their in-memory form and the external
//! key-value store.
//!
//! - [`CatalogCodec`] turns a `Catalog<T>` into bytes and back
//! - [`CatalogStore`] exposes get/put over the three fixed catalog keys
//! - [`handlers`] implements the storage and entropy effect traits
//!
//! The store offers single-key atomicity only. Nothing in this crate spans
//! more than one key; multi-catalog sequencing lives in `herd-ledger`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Catalog store adapter over `StorageEffects`
pub mod adapter;

/// Catalog byte codec
pub mod codec;

/// Storage and random effect handlers
pub mod handlers;

pub use adapter::CatalogStore;
pub use codec::CatalogCodec;
pub use handlers::{
    FilesystemStorageHandler, MemoryStorageHandler, OsRandomHandler, SequentialRandomHandler,
};
