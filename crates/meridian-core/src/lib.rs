//! # meridian-core: Pure Loyalty/Discount/Debt Logic for Meridian POS
//!
//! This crate is the **heart** of the Meridian POS loyalty engine. It
//! contains all business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Meridian POS Loyalty Engine                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Checkout / Returns UI or API                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                     meridian-engine                             │   │
//! │  │   evaluate_discount, finalize_invoice, record_debt_payment,     │   │
//! │  │   cancel_invoice, return_items                                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ meridian-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌────────┐ ┌─────────┐ ┌────────┐ ┌───────────┐  │   │
//! │  │   │ money  │ │  tier  │ │ window  │ │discount│ │  points   │  │   │
//! │  │   └────────┘ └────────┘ └─────────┘ └────────┘ └───────────┘  │   │
//! │  │   ┌────────┐ ┌──────────┐ ┌────────────┐ ┌────────────────┐   │   │
//! │  │   │ types  │ │   debt   │ │  reversal  │ │   validation   │   │   │
//! │  │   └────────┘ └──────────┘ └────────────┘ └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                     meridian-store                              │   │
//! │  │        Storage traits + in-memory reference implementation      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Invoice, Debt, history entries)
//! - [`money`] - Money and Percentage types with integer arithmetic
//! - [`tier`] - Tier catalog and spend classification
//! - [`window`] - Calendar usage-window resolution
//! - [`discount`] - Usage-windowed discount evaluation
//! - [`points`] - Points accrual and milestone redemption math
//! - [`debt`] - Debt creation, payments, return adjustments
//! - [`reversal`] - Cancellation and partial-return planning
//! - [`error`] - Domain error types with retry classification
//! - [`validation`] - Boundary input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic — "now" is always
//!    a parameter, never a clock read
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in the smallest currency
//!    unit (i64) to avoid float drift
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use meridian_core::money::{Money, Percentage};
//! use meridian_core::tier::{Tier, TierCatalog, UsageLimit};
//! use meridian_core::discount::DiscountCalculator;
//! use meridian_core::window::WindowKind;
//!
//! let catalog = TierCatalog::new(
//!     vec![Tier {
//!         name: "Nông dân".to_string(),
//!         min_spend_cents: 1_000_000,
//!         discount: Percentage::from_bps(500),
//!         points_multiplier: Percentage::one(),
//!         usage_limit: UsageLimit::new(1, WindowKind::Month),
//!         min_order_cents: 0,
//!     }],
//!     TierCatalog::unranked_base(),
//! );
//!
//! let now = Utc.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap();
//! let decision = DiscountCalculator::new(&catalog)
//!     .evaluate("c-1", Money::from_cents(2_000_000), Money::from_cents(200_000), &[], now)
//!     .unwrap();
//!
//! assert!(decision.approved);
//! assert_eq!(decision.amount_cents, 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod debt;
pub mod discount;
pub mod error;
pub mod money;
pub mod points;
pub mod reversal;
pub mod tier;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use meridian_core::Money` instead of
// `use meridian_core::money::Money`

pub use discount::{DenialReason, DiscountCalculator, DiscountDecision};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, Percentage};
pub use points::{Milestone, PointsPolicy, RedemptionQuote};
pub use reversal::{RefundResult, ReturnPlan, ReturnRequest};
pub use tier::{Tier, TierCatalog, UsageLimit};
pub use types::*;
pub use window::{UsageWindow, WindowKind};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Bound on automatic retries of a conflicted read-modify-write cycle.
///
/// ## Why bounded?
/// Conflict means another writer won the race; re-reading and re-applying
/// usually succeeds on the next attempt. If it keeps failing, the caller
/// should see the conflict rather than the engine spinning.
pub const MAX_CONFLICT_RETRIES: u32 = 3;
