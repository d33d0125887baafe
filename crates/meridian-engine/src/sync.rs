//! # Concurrency Helpers
//!
//! The per-entity serialization discipline from the concurrency model:
//! mutations are keyed by `customer_id` (checkout, reversal, points) or
//! `debt_id` (payment application). In-process requests serialize on a
//! per-key mutex; a versioned compare-and-swap in the store catches any
//! writer outside this process. Storage conflicts get a bounded retry that
//! re-reads all state each cycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use meridian_core::MAX_CONFLICT_RETRIES;

use crate::error::EngineResult;

// =============================================================================
// Entity Locks
// =============================================================================

/// Registry of per-key mutexes.
///
/// ## Why per-key?
/// Two checkouts for the SAME customer must serialize (they race for usage
/// slots and the points balance); checkouts for different customers must
/// not contend with each other.
#[derive(Debug, Default)]
pub(crate) struct EntityLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub(crate) fn new() -> Self {
        EntityLocks::default()
    }

    /// Returns the mutex for a key, creating it on first use.
    ///
    /// Locks accumulate per distinct key for the process lifetime; entity
    /// ids are bounded by the active customer/debt population.
    pub(crate) fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        self.inner
            .lock()
            .expect("lock registry poisoned")
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// =============================================================================
// Bounded Conflict Retry
// =============================================================================

/// Runs a read-modify-write cycle, retrying on retryable errors up to
/// [`MAX_CONFLICT_RETRIES`] attempts in total.
///
/// The closure must re-read every record it touches — that is what makes
/// the retry correct.
pub(crate) fn with_conflict_retry<T>(mut cycle: impl FnMut() -> EngineResult<T>) -> EngineResult<T> {
    let mut attempt = 1;
    loop {
        match cycle() {
            Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_RETRIES => {
                debug!(attempt, error = %err, "Conflict, retrying cycle");
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
