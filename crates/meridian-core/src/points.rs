//! # Points Ledger Math
//!
//! Accrual and redemption rules for the loyalty points currency.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ACCRUAL (at invoice finalization)                                      │
//! │                                                                         │
//! │  paid portion × base earn rate × tier multiplier ──► points (floored)  │
//! │                                                                         │
//! │  Only the PAID portion earns. The debt portion earns nothing until     │
//! │  it is paid off — and debt payments do not retroactively accrue,       │
//! │  which keeps accrual a single event per invoice.                       │
//! │                                                                         │
//! │  REDEMPTION (before finalization)                                       │
//! │                                                                         │
//! │  requested points ──► must EXACTLY match a milestone                   │
//! │                  ──► balance must cover it (denied, never clamped)     │
//! │                  ──► quote { points, currency value }, committed when  │
//! │                      the invoice finalizes                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage};
use crate::tier::Tier;

// =============================================================================
// Milestones
// =============================================================================

/// A fixed (points, currency value) redemption pair.
///
/// Redemptions happen only at these exact milestones; arbitrary point
/// amounts are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Milestone {
    pub points: i64,
    pub value_cents: i64,
}

impl Milestone {
    pub const fn new(points: i64, value_cents: i64) -> Self {
        Milestone { points, value_cents }
    }

    /// Currency value as Money.
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Earn rate plus the milestone table. Long-lived reference data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PointsPolicy {
    /// Base earn rate in basis points of spend: 100 bps = 1 point per 100
    /// currency units paid (before the tier multiplier).
    pub earn_rate: Percentage,
    /// Fixed redemption milestones.
    pub milestones: Vec<Milestone>,
}

impl PointsPolicy {
    pub fn new(earn_rate: Percentage, milestones: Vec<Milestone>) -> Self {
        PointsPolicy {
            earn_rate,
            milestones,
        }
    }

    /// Points earned for a paid amount under a tier.
    ///
    /// `paid × earn_rate × tier.points_multiplier`, floored to an integer.
    /// Flooring (not rounding) keeps accrual conservative: the ledger never
    /// grants a point that was not fully earned.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::{Money, Percentage};
    /// use meridian_core::points::PointsPolicy;
    /// use meridian_core::tier::TierCatalog;
    ///
    /// let policy = PointsPolicy::new(Percentage::from_bps(100), Vec::new());
    /// let tier = TierCatalog::unranked_base(); // 1.0× multiplier
    ///
    /// // 99_999 × 1% = 999.99 → 999 points
    /// assert_eq!(policy.accrual(Money::from_cents(99_999), &tier), 999);
    /// ```
    pub fn accrual(&self, paid: Money, tier: &Tier) -> i64 {
        if !paid.is_positive() {
            return 0;
        }
        // Two bps factors: divide by 10^8. i128 keeps the product exact.
        let raw = paid.cents() as i128
            * self.earn_rate.bps() as i128
            * tier.points_multiplier.bps() as i128;
        (raw / 100_000_000) as i64
    }

    /// Finds the milestone matching an exact point amount.
    pub fn milestone_for(&self, points: i64) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.points == points)
    }

    /// Validates a redemption request against the milestone table and the
    /// customer's balance.
    ///
    /// The resulting quote is a PENDING debit: points leave the balance
    /// only when the invoice using the quote is finalized.
    ///
    /// ## Failure Modes
    /// - `InvalidMilestone` — requested amount matches no milestone
    /// - `InsufficientPoints` — balance below requested (denied, never
    ///   clamped to the balance)
    pub fn quote_redemption(&self, balance: i64, requested: i64) -> CoreResult<RedemptionQuote> {
        let milestone = self
            .milestone_for(requested)
            .ok_or(CoreError::InvalidMilestone { requested })?;

        if balance < requested {
            return Err(CoreError::InsufficientPoints { balance, requested });
        }

        Ok(RedemptionQuote {
            points: milestone.points,
            value_cents: milestone.value_cents,
        })
    }
}

// =============================================================================
// Redemption Quote
// =============================================================================

/// An approved, not-yet-committed redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RedemptionQuote {
    /// Points to debit at commit.
    pub points: i64,
    /// Currency value deducted from the invoice total.
    pub value_cents: i64,
}

impl RedemptionQuote {
    /// Redemption value as Money.
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
