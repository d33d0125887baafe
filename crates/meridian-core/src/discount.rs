//! # Discount Calculator
//!
//! Evaluates whether a customer's tier discount applies to a candidate
//! order, against their usage window.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate(customer, subtotal, history, now)                             │
//! │                                                                         │
//! │  1. classify tier from lifetime spend                                   │
//! │       │                                                                 │
//! │       ├── no discount benefit ──────────► denied "no tier benefit"     │
//! │       │                                                                 │
//! │  2. subtotal < tier.min_order ──────────► denied "order below minimum" │
//! │       │                                                                 │
//! │  3. resolve active window (tier.usage_limit.window, now)               │
//! │       │                                                                 │
//! │  4. count prior tier-discounted invoices inside the window             │
//! │       │                                                                 │
//! │       ├── used >= limit ────────────────► denied "usage limit reached" │
//! │       │                                                                 │
//! │  5. approved: amount = subtotal × tier.discount                        │
//! │               remaining = limit − used − 1                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Approval is ADVISORY. The usage slot is consumed only when checkout
//! commits the invoice; the engine re-runs this evaluation inside the
//! commit cycle so two concurrent checkouts cannot both take the last slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, Percentage};
use crate::tier::TierCatalog;
use crate::types::{DiscountKind, Invoice, InvoiceStatus};
use crate::window::UsageWindow;

// =============================================================================
// Decision
// =============================================================================

/// Structured reason a discount was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Customer's tier carries no discount benefit.
    NoTierBenefit,
    /// Order subtotal is below the tier's minimum order value.
    OrderBelowMinimum,
    /// Every usage slot in the active window is already consumed.
    UsageLimitReached,
}

/// Outcome of a discount evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountDecision {
    /// Whether the discount applies.
    pub approved: bool,
    /// Discount amount (0 when denied).
    pub amount_cents: i64,
    /// The tier's discount rate.
    pub percentage: Percentage,
    /// Uses left in the active window after this one is consumed.
    pub remaining_uses: u32,
    /// Label of the active window instance (e.g. "2026-08").
    pub window_label: String,
    /// Tier the customer classified into.
    pub tier_name: String,
    /// Structured denial reason (None when approved).
    pub denial: Option<DenialReason>,
    /// Human-readable summary for the cashier UI.
    pub message: String,
}

impl DiscountDecision {
    /// Discount amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    fn denied(
        reason: DenialReason,
        tier_name: &str,
        percentage: Percentage,
        remaining_uses: u32,
        window_label: String,
        message: impl Into<String>,
    ) -> Self {
        DiscountDecision {
            approved: false,
            amount_cents: 0,
            percentage,
            remaining_uses,
            window_label,
            tier_name: tier_name.to_string(),
            denial: Some(reason),
            message: message.into(),
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Evaluates tier discounts against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct DiscountCalculator<'a> {
    catalog: &'a TierCatalog,
}

impl<'a> DiscountCalculator<'a> {
    pub fn new(catalog: &'a TierCatalog) -> Self {
        DiscountCalculator { catalog }
    }

    /// Evaluates a candidate order for `customer_id`.
    ///
    /// ## Arguments
    /// * `lifetime_spend` - the customer's lifetime paid spend (derived by
    ///   the caller from the invoice store)
    /// * `subtotal` - candidate order subtotal, must be ≥ 0
    /// * `history` - the customer's invoices; only prior successful tier
    ///   uses inside the active window are counted. The caller should
    ///   already scope the query to `(customer_id, window)` — this function
    ///   re-filters strictly, it does not trust the slice
    /// * `now` - the reference instant resolving the active window
    pub fn evaluate(
        &self,
        customer_id: &str,
        lifetime_spend: Money,
        subtotal: Money,
        history: &[Invoice],
        now: DateTime<Utc>,
    ) -> CoreResult<DiscountDecision> {
        if subtotal.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "subtotal".to_string(),
            }
            .into());
        }

        let tier = self.catalog.classify(lifetime_spend);

        if !tier.has_discount() {
            return Ok(DiscountDecision::denied(
                DenialReason::NoTierBenefit,
                &tier.name,
                Percentage::zero(),
                0,
                String::new(),
                "no tier benefit",
            ));
        }

        if subtotal < tier.min_order() {
            return Ok(DiscountDecision::denied(
                DenialReason::OrderBelowMinimum,
                &tier.name,
                tier.discount,
                tier.usage_limit.count,
                String::new(),
                format!("order below minimum of {}", tier.min_order()),
            ));
        }

        let window = UsageWindow::containing(tier.usage_limit.window, now);
        let used = count_tier_uses(customer_id, history, &window);

        if used >= tier.usage_limit.count {
            return Ok(DiscountDecision::denied(
                DenialReason::UsageLimitReached,
                &tier.name,
                tier.discount,
                0,
                window.label(),
                "usage limit reached",
            ));
        }

        let amount = tier.discount.of(subtotal);
        // Account for the use about to be consumed
        let remaining = tier.usage_limit.count - used - 1;

        Ok(DiscountDecision {
            approved: true,
            amount_cents: amount.cents(),
            percentage: tier.discount,
            remaining_uses: remaining,
            window_label: window.label(),
            tier_name: tier.name.clone(),
            denial: None,
            message: format!("{} discount for tier {}", tier.discount, tier.name),
        })
    }
}

/// Counts prior successful tier-discount uses inside the window.
///
/// Customer-scoped, never global. Cancelled invoices do not count — full
/// cancellation is what hands a consumed usage slot back. Partially and
/// fully returned invoices still count (returns keep the slot consumed).
pub fn count_tier_uses(customer_id: &str, history: &[Invoice], window: &UsageWindow) -> u32 {
    history
        .iter()
        .filter(|inv| {
            inv.customer_id == customer_id
                && inv.discount_kind == DiscountKind::Tier
                && inv.status != InvoiceStatus::Cancelled
                && window.contains(inv.date)
        })
        .count() as u32
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::{Tier, UsageLimit};
    use crate::window::WindowKind;
    use chrono::TimeZone;

    fn farmer_catalog() -> TierCatalog {
        // The "Nông dân" tier: 5% discount, once per month, no minimum order
        TierCatalog::new(
            vec![Tier {
                name: "Nông dân".to_string(),
                min_spend_cents: 1_000_000,
                discount: Percentage::from_bps(500),
                points_multiplier: Percentage::one(),
                usage_limit: UsageLimit::new(1, WindowKind::Month),
                min_order_cents: 0,
            }],
            TierCatalog::unranked_base(),
        )
    }

    fn tier_invoice(customer_id: &str, date: DateTime<Utc>) -> Invoice {
        Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            date,
            items: Vec::new(),
            subtotal_cents: 100_000,
            discount_cents: 5_000,
            discount_kind: DiscountKind::Tier,
            points_redeemed: 0,
            amount_paid_cents: 95_000,
            points_earned: 0,
            points_reversed: 0,
            refunded_cents: 0,
            returns: Vec::new(),
            debt_id: None,
            status: InvoiceStatus::Active,
            version: 0,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_denied_when_unranked() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);

        let decision = calc
            .evaluate("c-1", Money::from_cents(500), Money::from_cents(200_000), &[], at(2026, 8, 8))
            .unwrap();

        assert!(!decision.approved);
        assert_eq!(decision.denial, Some(DenialReason::NoTierBenefit));
        assert_eq!(decision.amount_cents, 0);
    }

    #[test]
    fn test_denied_below_minimum_order() {
        let catalog = TierCatalog::new(
            vec![Tier {
                name: "VIP".to_string(),
                min_spend_cents: 0,
                discount: Percentage::from_bps(1000),
                points_multiplier: Percentage::one(),
                usage_limit: UsageLimit::new(2, WindowKind::Week),
                min_order_cents: 100_000,
            }],
            TierCatalog::unranked_base(),
        );
        let calc = DiscountCalculator::new(&catalog);

        let decision = calc
            .evaluate("c-1", Money::from_cents(1), Money::from_cents(50_000), &[], at(2026, 8, 8))
            .unwrap();

        assert!(!decision.approved);
        assert_eq!(decision.denial, Some(DenialReason::OrderBelowMinimum));
    }

    /// Spec scenario: one prior tier-discounted invoice this month denies a
    /// second use; the next calendar month approves 5% of 200000 = 10000.
    #[test]
    fn test_monthly_limit_and_reset() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);
        let spend = Money::from_cents(2_000_000);
        let history = vec![tier_invoice("c-1", at(2026, 8, 2))];

        let denied = calc
            .evaluate("c-1", spend, Money::from_cents(200_000), &history, at(2026, 8, 8))
            .unwrap();
        assert!(!denied.approved);
        assert_eq!(denied.denial, Some(DenialReason::UsageLimitReached));
        assert_eq!(denied.remaining_uses, 0);

        let approved = calc
            .evaluate("c-1", spend, Money::from_cents(200_000), &history, at(2026, 9, 3))
            .unwrap();
        assert!(approved.approved);
        assert_eq!(approved.amount_cents, 10_000);
        assert_eq!(approved.remaining_uses, 0);
        assert_eq!(approved.window_label, "2026-09");
    }

    #[test]
    fn test_usage_counting_is_customer_scoped() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);

        // Another customer's invoice in the same window must not count
        let history = vec![tier_invoice("c-other", at(2026, 8, 2))];
        let decision = calc
            .evaluate(
                "c-1",
                Money::from_cents(2_000_000),
                Money::from_cents(200_000),
                &history,
                at(2026, 8, 8),
            )
            .unwrap();
        assert!(decision.approved);
    }

    #[test]
    fn test_cancelled_invoices_release_the_slot() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);

        let mut cancelled = tier_invoice("c-1", at(2026, 8, 2));
        cancelled.status = InvoiceStatus::Cancelled;

        let decision = calc
            .evaluate(
                "c-1",
                Money::from_cents(2_000_000),
                Money::from_cents(200_000),
                &[cancelled],
                at(2026, 8, 8),
            )
            .unwrap();
        assert!(decision.approved);
    }

    #[test]
    fn test_returned_invoices_keep_the_slot_consumed() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);

        let mut returned = tier_invoice("c-1", at(2026, 8, 2));
        returned.status = InvoiceStatus::PartiallyReturned;

        let decision = calc
            .evaluate(
                "c-1",
                Money::from_cents(2_000_000),
                Money::from_cents(200_000),
                &[returned],
                at(2026, 8, 8),
            )
            .unwrap();
        assert!(!decision.approved);
        assert_eq!(decision.denial, Some(DenialReason::UsageLimitReached));
    }

    #[test]
    fn test_window_boundary_is_exact() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);
        let spend = Money::from_cents(2_000_000);

        // Prior use one second before the month boundary still counts...
        let last_second = Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap();
        let history = vec![tier_invoice("c-1", last_second)];
        let denied = calc
            .evaluate("c-1", spend, Money::from_cents(100_000), &history, at(2026, 8, 31))
            .unwrap();
        assert!(!denied.approved);

        // ...but falls out of the next month's window entirely
        let next_month = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let approved = calc
            .evaluate("c-1", spend, Money::from_cents(100_000), &history, next_month)
            .unwrap();
        assert!(approved.approved);
    }

    #[test]
    fn test_negative_subtotal_is_a_validation_error() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);

        let err = calc
            .evaluate(
                "c-1",
                Money::from_cents(2_000_000),
                Money::from_cents(-1),
                &[],
                at(2026, 8, 8),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_remaining_uses_counts_down() {
        let catalog = TierCatalog::new(
            vec![Tier {
                name: "Gold".to_string(),
                min_spend_cents: 0,
                discount: Percentage::from_bps(1000),
                points_multiplier: Percentage::one(),
                usage_limit: UsageLimit::new(3, WindowKind::Month),
                min_order_cents: 0,
            }],
            TierCatalog::unranked_base(),
        );
        let calc = DiscountCalculator::new(&catalog);
        let spend = Money::from_cents(1);

        let history = vec![tier_invoice("c-1", at(2026, 8, 2))];
        let decision = calc
            .evaluate("c-1", spend, Money::from_cents(100_000), &history, at(2026, 8, 8))
            .unwrap();
        assert!(decision.approved);
        // 3 allowed, 1 used, 1 being consumed now → 1 left after this
        assert_eq!(decision.remaining_uses, 1);
    }

    #[test]
    fn test_decision_serializes_for_the_frontend() {
        let catalog = farmer_catalog();
        let calc = DiscountCalculator::new(&catalog);
        let decision = calc
            .evaluate(
                "c-1",
                Money::from_cents(2_000_000),
                Money::from_cents(200_000),
                &[],
                at(2026, 8, 8),
            )
            .unwrap();

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["approved"], true);
        assert_eq!(json["amount_cents"], 10_000);
        assert_eq!(json["window_label"], "2026-08");
    }
}
