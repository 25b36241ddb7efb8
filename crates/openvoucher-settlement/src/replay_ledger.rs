//! Replay ledger: the set of settled voucher ids.
//!
//! Like a spent-output set: each voucher id can be settled once. Attempting
//! to settle the same `unique_id` a second time returns
//! [`OpenvoucherError::AlreadyProcessed`].
//!
//! The set only grows. Unlike a bounded cache there is no eviction: an
//! evicted id could be redeemed again.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use openvoucher_types::{OpenvoucherError, Result, UniqueId};
use serde::{Deserialize, Serialize};

/// Persistable image of a [`ReplayLedger`]: settled ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySnapshot {
    pub settled: Vec<UniqueId>,
}

/// Set of settled voucher ids with atomic insert-or-fail.
///
/// Safe to share between threads. Of two concurrent `mark_settled` calls
/// for the same id, exactly one succeeds.
#[derive(Debug, Default)]
pub struct ReplayLedger {
    settled: Mutex<HashSet<UniqueId>>,
}

impl ReplayLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a previously taken snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ReplaySnapshot) -> Self {
        Self {
            settled: Mutex::new(snapshot.settled.iter().copied().collect()),
        }
    }

    /// Mark a voucher id as settled.
    ///
    /// # Errors
    /// Returns [`OpenvoucherError::AlreadyProcessed`] if `unique_id` has
    /// already been marked.
    pub fn mark_settled(&self, unique_id: UniqueId) -> Result<()> {
        if self.lock().insert(unique_id) {
            Ok(())
        } else {
            Err(OpenvoucherError::AlreadyProcessed(unique_id))
        }
    }

    /// Check whether a voucher id has already been settled.
    pub fn is_settled(&self, unique_id: UniqueId) -> bool {
        self.lock().contains(&unique_id)
    }

    /// Undo a mark made by the current, failed, redemption attempt.
    ///
    /// Only the engine's rollback path calls this.
    pub(crate) fn release(&self, unique_id: UniqueId) {
        self.lock().remove(&unique_id);
    }

    /// Number of settled ids.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of all settled ids.
    pub fn snapshot(&self) -> ReplaySnapshot {
        let mut settled: Vec<UniqueId> = self.lock().iter().copied().collect();
        settled.sort_unstable();
        ReplaySnapshot { settled }
    }

    // A panic while holding the lock cannot leave the set half-updated:
    // every critical section is a single insert/remove/contains.
    fn lock(&self) -> MutexGuard<'_, HashSet<UniqueId>> {
        self.settled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
