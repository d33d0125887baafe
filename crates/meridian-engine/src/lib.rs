//! # meridian-engine: Loyalty Orchestration for Meridian POS
//!
//! The public face of the loyalty/discount/debt engine. The checkout and
//! returns layer calls these operations; everything underneath is pure
//! core math plus injected storage.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Control Flow                              │
//! │                                                                         │
//! │  candidate subtotal                                                     │
//! │       │                                                                 │
//! │       ├── evaluate_discount() ──► advisory DiscountDecision            │
//! │       └── redeem_points() ──────► pending RedemptionQuote              │
//! │                │          (exclusive choice — DiscountChoice union)    │
//! │                ▼                                                        │
//! │  finalize_invoice(draft)                                               │
//! │       ├── re-evaluates the discount inside the commit cycle            │
//! │       ├── amount_paid < total → opens a Debt (+ history entry)         │
//! │       ├── accrues points on the PAID portion                           │
//! │       └── persists invoice + customer under per-customer CAS           │
//! │                                                                         │
//! │  later:                                                                 │
//! │       ├── record_debt_payment() / debt_history()                       │
//! │       ├── cancel_invoice()  (full reversal, frees the usage slot)      │
//! │       └── return_items()    (partial, quantity-accurate, idempotent)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Every mutating operation serializes on a per-customer (or per-debt)
//! mutex and commits through versioned compare-and-swap store writes;
//! storage conflicts are retried a bounded number of times with a full
//! re-read each cycle. Reversals validate everything before the first side
//! effect — partial application is never observable.
//!
//! ## Example
//! ```rust,no_run
//! use meridian_core::{Percentage, PointsPolicy, TierCatalog};
//! use meridian_engine::Engine;
//! use meridian_store::MemoryStore;
//!
//! let engine = Engine::new(
//!     MemoryStore::new(),
//!     TierCatalog::default(),
//!     PointsPolicy::new(Percentage::from_bps(100), Vec::new()),
//! );
//!
//! let _decision = engine.evaluate_discount("550e8400-e29b-41d4-a716-446655440000", 200_000);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use meridian_core::{PointsPolicy, RedemptionQuote, TierCatalog};
use meridian_store::Store;

pub mod clock;
pub mod error;
mod ops;
mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, EngineResult};

use sync::EntityLocks;

// =============================================================================
// Engine
// =============================================================================

/// The loyalty engine: tier discounts, points, debt, reversal.
///
/// Generic over the store so production wires the real persistence layer
/// while tests run against `meridian_store::MemoryStore`. All shared state
/// (the pending-redemption registry, the per-entity locks) lives here, so
/// one `Engine` instance should be shared per process.
pub struct Engine<S: Store> {
    pub(crate) store: S,
    pub(crate) catalog: TierCatalog,
    pub(crate) points: PointsPolicy,
    pub(crate) clock: Arc<dyn Clock>,
    /// One pending redemption per customer, committed at finalization.
    pub(crate) pending: Mutex<HashMap<String, RedemptionQuote>>,
    /// Per-customer / per-debt serialization.
    pub(crate) locks: EntityLocks,
}

impl<S: Store> Engine<S> {
    /// Creates an engine on the system clock.
    pub fn new(store: S, catalog: TierCatalog, points: PointsPolicy) -> Self {
        Engine {
            store,
            catalog,
            points,
            clock: Arc::new(SystemClock),
            pending: Mutex::new(HashMap::new()),
            locks: EntityLocks::new(),
        }
    }

    /// Replaces the clock (tests pin a `ManualClock` here).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The underlying store, for seeding and assertions.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The tier catalog this engine classifies against.
    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    /// The points policy this engine accrues and redeems with.
    pub fn points_policy(&self) -> &PointsPolicy {
        &self.points
    }
}

impl<S: Store + std::fmt::Debug> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}
