//! # Invoice Reversal Math
//!
//! Pure planning and bookkeeping for cancellations and partial returns.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Active ──────────────► Cancelled      (full, from Active only)       │
//! │     │                                                                   │
//! │     └──► PartiallyReturned ──► PartiallyReturned ──► FullyReturned     │
//! │               (re-enterable while any line has returnable quantity)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refund Formula
//! Returning `q` of `Q` units on a line refunds
//! `(unit_price + item_discount / Q) × q` — the per-unit share of the line
//! discount travels with each unit. Integer division floors the per-unit
//! share, so cumulative partial returns never exceed the line's worth.
//!
//! Planning is separated from application: `plan_return` validates the whole
//! request and computes every amount without touching the invoice, so the
//! engine can make reversal all-or-nothing (nothing is applied unless every
//! line validates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, ReturnRecord};

// =============================================================================
// Request / Plan Types
// =============================================================================

/// One line of a return request: give back `quantity` units of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Computed refund for one requested line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRefund {
    pub product_id: String,
    pub quantity: i64,
    pub refund_cents: i64,
}

/// A fully validated return, ready to apply.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnPlan {
    pub lines: Vec<LineRefund>,
    /// Total refund across all lines.
    pub refund_cents: i64,
    /// Points to claw back, prorated by the refund's share of the original
    /// total and capped at what is still reversible.
    pub points_reversal: i64,
    /// Whether applying this plan returns the last outstanding unit.
    pub completes_invoice: bool,
}

/// Caller-facing summary of an applied return.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundResult {
    pub invoice_id: String,
    pub lines: Vec<LineRefund>,
    /// Total amount refunded.
    pub refund_cents: i64,
    /// Portion of the refund absorbed by the linked debt (owed in cash to
    /// the customer: `refund_cents − debt_reduced_cents`).
    pub debt_reduced_cents: i64,
    /// Points clawed back from the customer's balance.
    pub points_reversed: i64,
    /// Invoice status after the return.
    pub status: InvoiceStatus,
}

// =============================================================================
// Planning
// =============================================================================

/// Validates a return request against an invoice and computes the refund.
///
/// The invoice is not modified. Every line is checked before any amount is
/// computed, in this order:
/// 1. invoice state accepts returns
/// 2. quantities are positive, products appear at most once per request
/// 3. the product exists on the invoice
/// 4. the identical (product, quantity) pair was not already returned —
///    resubmissions are rejected, not refunded twice
/// 5. the quantity does not exceed what is still returnable
pub fn plan_return(invoice: &Invoice, requests: &[ReturnRequest]) -> CoreResult<ReturnPlan> {
    if !invoice.status.accepts_returns() {
        return Err(CoreError::InvalidInvoiceStatus {
            invoice_id: invoice.id.clone(),
            status: format!("{:?}", invoice.status),
        });
    }

    if requests.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    let mut lines = Vec::with_capacity(requests.len());
    let mut refund_total = Money::zero();

    for (idx, request) in requests.iter().enumerate() {
        if request.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "return quantity".to_string(),
            }
            .into());
        }

        if requests[..idx]
            .iter()
            .any(|r| r.product_id == request.product_id)
        {
            return Err(ValidationError::Duplicate {
                field: "product_id".to_string(),
                value: request.product_id.clone(),
            }
            .into());
        }

        let item = invoice.item(&request.product_id).ok_or_else(|| {
            CoreError::UnknownReturnItem {
                invoice_id: invoice.id.clone(),
                product_id: request.product_id.clone(),
            }
        })?;

        let duplicate = invoice
            .returns
            .iter()
            .any(|r| r.product_id == request.product_id && r.quantity == request.quantity);
        if duplicate {
            return Err(CoreError::AlreadyReturned {
                product_id: request.product_id.clone(),
                quantity: request.quantity,
            });
        }

        let available = item.returnable_quantity();
        if request.quantity > available {
            return Err(CoreError::OverReturn {
                product_id: request.product_id.clone(),
                requested: request.quantity,
                available,
            });
        }

        let refund = line_refund(item.unit_price_cents, item.item_discount_cents, item.quantity)
            .multiply_quantity(request.quantity);
        refund_total += refund;

        lines.push(LineRefund {
            product_id: request.product_id.clone(),
            quantity: request.quantity,
            refund_cents: refund.cents(),
        });
    }

    Ok(ReturnPlan {
        points_reversal: points_reversal(invoice, refund_total),
        completes_invoice: completes(invoice, &lines),
        refund_cents: refund_total.cents(),
        lines,
    })
}

/// Per-unit refund: unit price plus the unit's share of the line discount.
fn line_refund(unit_price_cents: i64, item_discount_cents: i64, quantity: i64) -> Money {
    if quantity <= 0 {
        return Money::zero();
    }
    Money::from_cents(unit_price_cents + item_discount_cents / quantity)
}

/// Prorates accrued points by the refund's share of the original total,
/// flooring, and caps at what has not been reversed yet. Never negative.
fn points_reversal(invoice: &Invoice, refund: Money) -> i64 {
    let original = invoice.original_total();
    if invoice.points_earned <= 0 || !original.is_positive() {
        return 0;
    }

    let prorated =
        Money::from_cents(invoice.points_earned).prorate(refund.cents(), original.cents());
    let reversible = invoice.points_earned - invoice.points_reversed;
    prorated.cents().min(reversible).max(0)
}

fn completes(invoice: &Invoice, lines: &[LineRefund]) -> bool {
    invoice.items.iter().all(|item| {
        let returning = lines
            .iter()
            .find(|l| l.product_id == item.product_id)
            .map(|l| l.quantity)
            .unwrap_or(0);
        item.returned_quantity + returning >= item.quantity
    })
}

// =============================================================================
// Application
// =============================================================================

/// Applies a validated plan to the invoice.
///
/// Only call with a plan produced from this same invoice state; the engine
/// guarantees that by planning and applying inside one commit cycle.
pub fn apply_return(invoice: &mut Invoice, plan: &ReturnPlan, now: DateTime<Utc>) {
    for line in &plan.lines {
        if let Some(item) = invoice
            .items
            .iter_mut()
            .find(|i| i.product_id == line.product_id)
        {
            item.returned_quantity += line.quantity;
        }
        invoice.returns.push(ReturnRecord {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            refund_cents: line.refund_cents,
            returned_at: now,
        });
    }

    invoice.refunded_cents += plan.refund_cents;
    invoice.points_reversed += plan.points_reversal;
    invoice.status = if invoice.all_items_returned() {
        InvoiceStatus::FullyReturned
    } else {
        InvoiceStatus::PartiallyReturned
    };
}

// =============================================================================
// Cancellation
// =============================================================================

/// Net change to the customer's points balance when an invoice is
/// cancelled: redeemed points come back, accrued points (less any already
/// clawed back by returns) are taken away.
///
/// The engine saturates the resulting balance at zero — a customer who
/// already spent the accrued points cannot go negative.
pub fn net_points_delta_on_cancellation(invoice: &Invoice) -> i64 {
    invoice.points_redeemed - (invoice.points_earned - invoice.points_reversed)
}

// =============================================================================
// Unit Tests
// =============================================================================
