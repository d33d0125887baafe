//! # Tier Catalog & Classifier
//!
//! Static reference data mapping lifetime spend to loyalty tiers, and the
//! classifier that walks it.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TierCatalog (ordered by min_spend, highest first)                      │
//! │                                                                         │
//! │  ┌──────────────┬───────────┬──────────┬─────────────┬──────────────┐  │
//! │  │ tier         │ min_spend │ discount │ usage limit │ min order    │  │
//! │  ├──────────────┼───────────┼──────────┼─────────────┼──────────────┤  │
//! │  │ "Đại gia"    │ 5,000,000 │ 10%      │ 2 / month   │ 100,000      │  │
//! │  │ "Nông dân"   │ 1,000,000 │ 5%       │ 1 / month   │ 0            │  │
//! │  │ (unranked)   │ —         │ 0%       │ —           │ —            │  │
//! │  └──────────────┴───────────┴──────────┴─────────────┴──────────────┘  │
//! │                                                                         │
//! │  classify(spend) returns the FIRST row whose min_spend ≤ spend,        │
//! │  falling back to the unranked base tier. Pure, no error cases.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage-limit policy is structured data (`count` + `window`), not the
//! hand-formatted strings ("Max 50k, 1/tuần") the storefront used to carry.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Percentage};
use crate::window::WindowKind;

// =============================================================================
// Usage Limit
// =============================================================================

/// How often a tier's discount may be used: `count` times per calendar
/// `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UsageLimit {
    pub count: u32,
    pub window: WindowKind,
}

impl UsageLimit {
    pub const fn new(count: u32, window: WindowKind) -> Self {
        UsageLimit { count, window }
    }
}

// =============================================================================
// Tier
// =============================================================================

/// A customer classification bucket driven by lifetime paid spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tier {
    /// Display name (also the stable key in logs and decisions).
    pub name: String,
    /// Minimum lifetime paid spend to qualify.
    pub min_spend_cents: i64,
    /// Discount granted on qualifying orders.
    pub discount: Percentage,
    /// Points earn multiplier (10000 bps = 1.0×).
    pub points_multiplier: Percentage,
    /// How often the discount may be used.
    pub usage_limit: UsageLimit,
    /// Minimum order subtotal for the discount to apply.
    pub min_order_cents: i64,
}

impl Tier {
    /// Returns the qualification threshold as Money.
    #[inline]
    pub fn min_spend(&self) -> Money {
        Money::from_cents(self.min_spend_cents)
    }

    /// Returns the minimum order value as Money.
    #[inline]
    pub fn min_order(&self) -> Money {
        Money::from_cents(self.min_order_cents)
    }

    /// Whether this tier grants any discount at all.
    /// The unranked base tier does not.
    #[inline]
    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}

// =============================================================================
// Tier Catalog
// =============================================================================

/// The static tier table plus the unranked base tier.
///
/// Long-lived reference data: built once at startup (or per tenant) and
/// shared read-only. Tiers are held sorted by descending `min_spend_cents`
/// so classification is a single forward walk.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierCatalog {
    /// Ranked tiers, highest qualification threshold first.
    ranked: Vec<Tier>,
    /// Fallback for customers below every threshold. No discount benefit.
    base: Tier,
}

impl TierCatalog {
    /// Builds a catalog, sorting ranked tiers by descending min spend.
    pub fn new(ranked: Vec<Tier>, base: Tier) -> Self {
        let mut ranked = ranked;
        ranked.sort_by(|a, b| b.min_spend_cents.cmp(&a.min_spend_cents));
        TierCatalog { ranked, base }
    }

    /// The unranked base tier used when no ranked tier matches.
    pub fn base(&self) -> &Tier {
        &self.base
    }

    /// Ranked tiers, highest threshold first.
    pub fn ranked(&self) -> &[Tier] {
        &self.ranked
    }

    /// Classifies a lifetime paid spend into a tier.
    ///
    /// Walks the catalog from the highest `min_spend` downward and returns
    /// the first tier whose threshold the spend meets; the unranked base
    /// tier if none match. Pure function, no side effects, no error cases.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::{Money, Percentage};
    /// use meridian_core::tier::{Tier, TierCatalog, UsageLimit};
    /// use meridian_core::window::WindowKind;
    ///
    /// let farmer = Tier {
    ///     name: "Nông dân".to_string(),
    ///     min_spend_cents: 1_000_000,
    ///     discount: Percentage::from_bps(500),
    ///     points_multiplier: Percentage::one(),
    ///     usage_limit: UsageLimit::new(1, WindowKind::Month),
    ///     min_order_cents: 0,
    /// };
    /// let catalog = TierCatalog::new(vec![farmer], TierCatalog::unranked_base());
    ///
    /// assert_eq!(catalog.classify(Money::from_cents(2_000_000)).name, "Nông dân");
    /// assert!(!catalog.classify(Money::from_cents(500)).has_discount());
    /// ```
    pub fn classify(&self, lifetime_spend: Money) -> &Tier {
        self.ranked
            .iter()
            .find(|t| t.min_spend_cents <= lifetime_spend.cents())
            .unwrap_or(&self.base)
    }

    /// A conventional unranked base tier: no discount, 1.0× points.
    pub fn unranked_base() -> Tier {
        Tier {
            name: "Unranked".to_string(),
            min_spend_cents: 0,
            discount: Percentage::zero(),
            points_multiplier: Percentage::one(),
            usage_limit: UsageLimit::new(0, WindowKind::Month),
            min_order_cents: 0,
        }
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        TierCatalog::new(Vec::new(), TierCatalog::unranked_base())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, min_spend: i64, bps: u32) -> Tier {
        Tier {
            name: name.to_string(),
            min_spend_cents: min_spend,
            discount: Percentage::from_bps(bps),
            points_multiplier: Percentage::one(),
            usage_limit: UsageLimit::new(1, WindowKind::Month),
            min_order_cents: 0,
        }
    }

    fn catalog() -> TierCatalog {
        TierCatalog::new(
            vec![
                tier("Silver", 1_000_000, 500),
                tier("Gold", 5_000_000, 1000),
                tier("Bronze", 200_000, 200),
            ],
            TierCatalog::unranked_base(),
        )
    }

    #[test]
    fn test_classify_picks_highest_qualifying() {
        let c = catalog();
        assert_eq!(c.classify(Money::from_cents(10_000_000)).name, "Gold");
        assert_eq!(c.classify(Money::from_cents(5_000_000)).name, "Gold");
        assert_eq!(c.classify(Money::from_cents(4_999_999)).name, "Silver");
        assert_eq!(c.classify(Money::from_cents(250_000)).name, "Bronze");
    }

    #[test]
    fn test_classify_falls_back_to_base() {
        let c = catalog();
        let t = c.classify(Money::from_cents(100));
        assert_eq!(t.name, "Unranked");
        assert!(!t.has_discount());
    }

    #[test]
    fn test_catalog_sorts_on_construction() {
        // Intentionally unsorted input above; ranked() must come out
        // highest-first or classification would stop early.
        let c = catalog();
        let thresholds: Vec<i64> = c.ranked().iter().map(|t| t.min_spend_cents).collect();
        assert_eq!(thresholds, vec![5_000_000, 1_000_000, 200_000]);
    }

    #[test]
    fn test_zero_spend_with_zero_threshold_tier() {
        // A ranked tier at threshold 0 beats the base tier
        let c = TierCatalog::new(vec![tier("Everyone", 0, 100)], TierCatalog::unranked_base());
        assert_eq!(c.classify(Money::zero()).name, "Everyone");
    }
}
