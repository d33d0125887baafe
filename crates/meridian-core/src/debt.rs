//! # Debt Ledger Math
//!
//! Creation, payment application, and return adjustment for customer debt.
//!
//! ## Debt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Debt Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (checkout, amount_paid < total)                             │
//! │     └── open_debt() → Debt { remaining = total − paid }                │
//! │     └── history += { create_debt, amount, remaining_after }            │
//! │                                                                         │
//! │  2. PAYMENTS (any number, each 0 < amount ≤ remaining)                 │
//! │     └── apply_payment() → remaining −= amount                          │
//! │     └── history += { payment, amount, remaining_after }                │
//! │     └── remaining == 0 → status = Settled                              │
//! │                                                                         │
//! │  3a. RETURN ADJUSTMENT (partial return shrinks the debt)               │
//! │      └── apply_return_adjustment() → original −= Δ, remaining −= Δ     │
//! │                                                                         │
//! │  3b. CANCELLATION (invoice cancelled → debt + history deleted)         │
//! │                                                                         │
//! │  Invariant at every step:                                              │
//! │    remaining == original − sum(payments)   and   remaining ≥ 0         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An overpayment is REJECTED, not clamped: the caller must re-query the
//! current remaining amount first. That re-query is the optimistic-
//! concurrency contract for payment application.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Debt, DebtHistoryEntry, DebtHistoryKind, DebtPayment, DebtStatus, Invoice};

/// Actor recorded on history entries the system itself produces.
pub const SYSTEM_ACTOR: &str = "system";

// =============================================================================
// Creation
// =============================================================================

/// Opens a debt for an underpaid invoice.
///
/// Returns `None` when the invoice is fully paid — no zero-amount debt
/// records are ever created.
pub fn open_debt(
    invoice: &Invoice,
    debt_id: impl Into<String>,
    now: DateTime<Utc>,
) -> Option<(Debt, DebtHistoryEntry)> {
    let shortfall = invoice.debt_amount();
    if !shortfall.is_positive() {
        return None;
    }

    let debt = Debt {
        id: debt_id.into(),
        customer_id: invoice.customer_id.clone(),
        invoice_id: invoice.id.clone(),
        original_cents: shortfall.cents(),
        remaining_cents: shortfall.cents(),
        status: DebtStatus::Open,
        created_at: now,
        version: 0,
    };

    let entry = DebtHistoryEntry {
        debt_id: debt.id.clone(),
        customer_id: debt.customer_id.clone(),
        invoice_id: debt.invoice_id.clone(),
        kind: DebtHistoryKind::CreateDebt,
        amount_cents: shortfall.cents(),
        remaining_after_cents: shortfall.cents(),
        at: now,
        actor: SYSTEM_ACTOR.to_string(),
    };

    Some((debt, entry))
}

// =============================================================================
// Payments
// =============================================================================

/// Applies a payment to a debt, returning the history entry to append.
///
/// ## Failure Modes
/// - amount ≤ 0 → validation error
/// - amount > remaining → `PaymentExceedsRemaining` (this also covers any
///   positive payment against a settled debt, whose remaining is zero)
pub fn apply_payment(debt: &mut Debt, payment: &DebtPayment) -> CoreResult<DebtHistoryEntry> {
    if payment.amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        }
        .into());
    }

    if payment.amount_cents > debt.remaining_cents {
        return Err(CoreError::PaymentExceedsRemaining {
            debt_id: debt.id.clone(),
            remaining: debt.remaining_cents,
            requested: payment.amount_cents,
        });
    }

    debt.remaining_cents -= payment.amount_cents;
    if debt.remaining_cents == 0 {
        debt.status = DebtStatus::Settled;
    }

    Ok(DebtHistoryEntry {
        debt_id: debt.id.clone(),
        customer_id: debt.customer_id.clone(),
        invoice_id: debt.invoice_id.clone(),
        kind: DebtHistoryKind::Payment,
        amount_cents: payment.amount_cents,
        remaining_after_cents: debt.remaining_cents,
        at: payment.paid_at,
        actor: payment.recorded_by.clone(),
    })
}

// =============================================================================
// Return Adjustments
// =============================================================================

/// Shrinks a debt because part of the underlying invoice was returned.
///
/// The refund reduces `original` and `remaining` together (clamped at the
/// current remaining balance), which preserves
/// `remaining == original − sum(payments)` without fabricating a payment.
/// Returns the amount actually absorbed by the debt; any excess refund is
/// owed to the customer in cash by the caller.
pub fn apply_return_adjustment(debt: &mut Debt, refund: Money) -> Money {
    if !refund.is_positive() || debt.remaining_cents == 0 {
        return Money::zero();
    }

    let delta = refund.cents().min(debt.remaining_cents);
    debt.remaining_cents -= delta;
    debt.original_cents -= delta;
    if debt.remaining_cents == 0 {
        debt.status = DebtStatus::Settled;
    }

    Money::from_cents(delta)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscountKind, InvoiceItem, InvoiceStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap()
    }

    fn underpaid_invoice(total: i64, paid: i64) -> Invoice {
        Invoice {
            id: "inv-1".to_string(),
            customer_id: "c-1".to_string(),
            date: now(),
            items: vec![InvoiceItem::new("p-1", "Feed 20kg", total, 0, 1, 0)],
            subtotal_cents: total,
            discount_cents: 0,
            discount_kind: DiscountKind::None,
            points_redeemed: 0,
            amount_paid_cents: paid,
            points_earned: 0,
            points_reversed: 0,
            refunded_cents: 0,
            returns: Vec::new(),
            debt_id: None,
            status: InvoiceStatus::Active,
            version: 0,
        }
    }

    fn payment(amount: i64) -> DebtPayment {
        DebtPayment {
            debt_id: "d-1".to_string(),
            amount_cents: amount,
            paid_at: now(),
            recorded_by: "cashier-1".to_string(),
        }
    }

    #[test]
    fn test_open_debt_on_shortfall() {
        let inv = underpaid_invoice(500_000, 0);
        let (debt, entry) = open_debt(&inv, "d-1", now()).unwrap();

        assert_eq!(debt.original_cents, 500_000);
        assert_eq!(debt.remaining_cents, 500_000);
        assert_eq!(debt.status, DebtStatus::Open);
        assert_eq!(entry.kind, DebtHistoryKind::CreateDebt);
        assert_eq!(entry.remaining_after_cents, 500_000);
    }

    #[test]
    fn test_no_debt_when_fully_paid() {
        let inv = underpaid_invoice(500_000, 500_000);
        assert!(open_debt(&inv, "d-1", now()).is_none());

        let overpaid = underpaid_invoice(500_000, 600_000);
        assert!(open_debt(&overpaid, "d-1", now()).is_none());
    }

    /// Spec scenario: 500000 debt, pay 200000 then 300000, then any further
    /// positive payment is rejected.
    #[test]
    fn test_payment_sequence_settles() {
        let inv = underpaid_invoice(500_000, 0);
        let (mut debt, _) = open_debt(&inv, "d-1", now()).unwrap();

        let e1 = apply_payment(&mut debt, &payment(200_000)).unwrap();
        assert_eq!(debt.remaining_cents, 300_000);
        assert_eq!(debt.status, DebtStatus::Open);
        assert_eq!(e1.remaining_after_cents, 300_000);

        let e2 = apply_payment(&mut debt, &payment(300_000)).unwrap();
        assert_eq!(debt.remaining_cents, 0);
        assert_eq!(debt.status, DebtStatus::Settled);
        assert_eq!(e2.remaining_after_cents, 0);

        let err = apply_payment(&mut debt, &payment(1)).unwrap_err();
        assert!(matches!(err, CoreError::PaymentExceedsRemaining { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::LimitExceeded);
    }

    #[test]
    fn test_overpayment_rejected_not_clamped() {
        let inv = underpaid_invoice(500_000, 200_000);
        let (mut debt, _) = open_debt(&inv, "d-1", now()).unwrap();
        assert_eq!(debt.remaining_cents, 300_000);

        let err = apply_payment(&mut debt, &payment(300_001)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsRemaining {
                remaining: 300_000,
                requested: 300_001,
                ..
            }
        ));
        // Balance untouched after the rejection
        assert_eq!(debt.remaining_cents, 300_000);
    }

    #[test]
    fn test_non_positive_payments_rejected() {
        let inv = underpaid_invoice(500_000, 0);
        let (mut debt, _) = open_debt(&inv, "d-1", now()).unwrap();

        assert!(apply_payment(&mut debt, &payment(0)).is_err());
        assert!(apply_payment(&mut debt, &payment(-100)).is_err());
        assert_eq!(debt.remaining_cents, 500_000);
    }

    #[test]
    fn test_reconciliation_invariant_holds() {
        let inv = underpaid_invoice(500_000, 0);
        let (mut debt, create) = open_debt(&inv, "d-1", now()).unwrap();
        let mut paid_total = 0i64;

        for amount in [50_000, 125_000, 25_000] {
            let entry = apply_payment(&mut debt, &payment(amount)).unwrap();
            paid_total += amount;
            assert_eq!(debt.remaining_cents, create.amount_cents - paid_total);
            assert_eq!(entry.remaining_after_cents, debt.remaining_cents);
            assert!(debt.remaining_cents >= 0);
        }
    }

    #[test]
    fn test_return_adjustment_shrinks_both_sides() {
        let inv = underpaid_invoice(500_000, 100_000);
        let (mut debt, _) = open_debt(&inv, "d-1", now()).unwrap();
        assert_eq!(debt.remaining_cents, 400_000);

        apply_payment(&mut debt, &payment(100_000)).unwrap();

        let absorbed = apply_return_adjustment(&mut debt, Money::from_cents(150_000));
        assert_eq!(absorbed.cents(), 150_000);
        assert_eq!(debt.remaining_cents, 150_000);
        assert_eq!(debt.original_cents, 250_000);
        // remaining == original − sum(payments): 250000 − 100000 = 150000
    }

    #[test]
    fn test_return_adjustment_clamps_at_remaining() {
        let inv = underpaid_invoice(500_000, 450_000);
        let (mut debt, _) = open_debt(&inv, "d-1", now()).unwrap();
        assert_eq!(debt.remaining_cents, 50_000);

        let absorbed = apply_return_adjustment(&mut debt, Money::from_cents(200_000));
        assert_eq!(absorbed.cents(), 50_000);
        assert_eq!(debt.remaining_cents, 0);
        assert_eq!(debt.status, DebtStatus::Settled);

        // Settled debt absorbs nothing further
        let absorbed = apply_return_adjustment(&mut debt, Money::from_cents(10_000));
        assert!(absorbed.is_zero());
    }
}
