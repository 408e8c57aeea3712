//! # Obligation Locking
//!
//! Serializes revision sessions per storage obligation.
//!
//! ## Purpose
//!
//! Two sessions revising the same contract at once would both start from
//! the same revision and the later commit would silently discard the
//! earlier one. A session holds its obligation's lock from entry until it
//! exits.
//!
//! ## Implementation
//!
//! One `tokio::sync::Mutex` per locked obligation, kept in a table that only
//! contains obligations somebody holds or waits for. The lock is released
//! when the [`ObligationGuard`] is dropped (RAII), on every exit path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::{short_hex, ContractId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error};

use crate::domain::LockError;

type LockTable = Arc<Mutex<HashMap<ContractId, Arc<AsyncMutex<()>>>>>;

// =============================================================================
// OBLIGATION LOCKER
// =============================================================================

/// Table of per-obligation locks. Cheap to clone; clones share the table.
#[derive(Clone, Default)]
pub struct ObligationLocker {
    table: LockTable,
}

impl ObligationLocker {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `id`, created if missing.
    fn entry(&self, id: &ContractId) -> Arc<AsyncMutex<()>> {
        self.table.lock().entry(*id).or_default().clone()
    }

    /// Take the lock without waiting.
    pub fn try_lock(&self, id: &ContractId) -> Result<ObligationGuard, LockError> {
        let entry = self.entry(id);
        match entry.try_lock_owned() {
            Ok(guard) => Ok(self.guard(*id, guard)),
            Err(_) => {
                // `entry` was consumed by the failed attempt.
                self.remove_if_idle(id);
                Err(LockError::AlreadyLocked(*id))
            }
        }
    }

    /// Take the lock, waiting at most `timeout`.
    pub async fn lock(
        &self,
        id: &ContractId,
        timeout: Duration,
    ) -> Result<ObligationGuard, LockError> {
        let entry = self.entry(id);
        match tokio::time::timeout(timeout, entry.lock_owned()).await {
            Ok(guard) => {
                debug!("[revise] locked obligation {}", short_hex(id));
                Ok(self.guard(*id, guard))
            }
            Err(_) => {
                self.remove_if_idle(id);
                Err(LockError::Timeout {
                    id: *id,
                    waited_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Whether anyone currently holds the lock for `id`.
    pub fn is_locked(&self, id: &ContractId) -> bool {
        self.table
            .lock()
            .get(id)
            .is_some_and(|entry| entry.try_lock().is_err())
    }

    /// Number of obligations with a holder or waiter.
    pub fn active_count(&self) -> usize {
        self.table.lock().len()
    }

    fn guard(&self, id: ContractId, guard: OwnedMutexGuard<()>) -> ObligationGuard {
        ObligationGuard {
            id,
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Drop the table entry if nobody holds or waits on it.
    fn remove_if_idle(&self, id: &ContractId) {
        let mut table = self.table.lock();
        if table.get(id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            table.remove(id);
        }
    }
}

// =============================================================================
// OBLIGATION GUARD
// =============================================================================

/// Proof that the holder owns an obligation's lock. Released on drop.
pub struct ObligationGuard {
    id: ContractId,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ObligationGuard {
    /// Obligation this guard locks.
    pub fn id(&self) -> &ContractId {
        &self.id
    }
}

impl std::fmt::Debug for ObligationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObligationGuard")
            .field("id", &short_hex(&self.id))
            .finish()
    }
}

impl Drop for ObligationGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        // Release while holding the table so no waiter can race the cleanup.
        self.guard.take();

        match table.get(&self.id) {
            Some(entry) => {
                if Arc::strong_count(entry) == 1 {
                    table.remove(&self.id);
                }
            }
            None => {
                error!(
                    "[revise] released lock for obligation {} missing from lock table",
                    short_hex(&self.id)
                );
            }
        }
        debug!("[revise] unlocked obligation {}", short_hex(&self.id));
    }
}

// =============================================================================
// TESTS
// =============================================================================
