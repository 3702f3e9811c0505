//! Identifier allocation
//!
//! UUID v4 collisions are improbable, not impossible, so every candidate is
//! checked against the live catalog it is about to enter.

use herd_core::{Catalog, CatalogEntry, HerdError, LedgerIdentifier, RandomEffects, Result};
use tracing::warn;

/// Draws fresh identifiers that do not collide with a live catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    max_attempts: u32,
}

impl IdAllocator {
    /// Allocator giving up after `max_attempts` colliding draws (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw an identifier absent from `live`.
    pub async fn allocate<T, R>(&self, random: &R, live: &Catalog<T>) -> Result<T::Id>
    where
        T: CatalogEntry,
        R: RandomEffects + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = <T::Id as LedgerIdentifier>::from_uuid(random.random_uuid().await);
            if !live.contains(&candidate) {
                return Ok(candidate);
            }
            warn!(
                catalog = %T::KIND,
                candidate = %candidate,
                attempt,
                "Generated identifier collides with a live entry"
            );
        }
        Err(HerdError::conflict(format!(
            "could not allocate a unique {} identifier after {} attempts",
            T::KIND,
            self.max_attempts
        )))
    }
}
