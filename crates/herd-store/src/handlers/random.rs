//! Identifier entropy handlers

use async_trait::async_trait;
use herd_core::RandomEffects;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Production entropy source backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomHandler;

impl OsRandomHandler {
    /// Create a new OS-backed random handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomEffects for OsRandomHandler {
    async fn random_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic entropy source for tests and simulations.
///
/// Yields `start`, `start + step`, `start + 2*step`, ... as UUIDs. A step of
/// zero repeats the same value forever, which is how tests force identifier
/// collisions.
#[derive(Debug)]
pub struct SequentialRandomHandler {
    next: AtomicU64,
    step: u64,
}

impl SequentialRandomHandler {
    /// Count upward from 1
    pub fn new() -> Self {
        Self::starting_at(1, 1)
    }

    /// Count from `start` in increments of `step`
    pub fn starting_at(start: u64, step: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            step,
        }
    }

    /// Always yield the same value
    pub fn constant(value: u64) -> Self {
        Self::starting_at(value, 0)
    }
}

impl Default for SequentialRandomHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RandomEffects for SequentialRandomHandler {
    async fn random_uuid(&self) -> Uuid {
        let value = self.next.fetch_add(self.step, Ordering::SeqCst);
        Uuid::from_u128(u128::from(value))
    }
}
