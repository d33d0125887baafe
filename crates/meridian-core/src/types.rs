//! # Domain Types
//!
//! Core domain types for the loyalty/discount/debt engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Invoice     │   │      Debt       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  points         │   │  items[]        │   │  original       │       │
//! │  │  version        │   │  discount_kind  │   │  remaining      │       │
//! │  └─────────────────┘   │  returns[]      │   │  status         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountKind   │   │  InvoiceStatus  │   │ DebtHistoryEntry│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  None           │   │  Active         │   │  create_debt    │       │
//! │  │  Tier           │   │  Cancelled      │   │  payment        │       │
//! │  │  Points         │   │  Partially/     │   │  (append-only)  │       │
//! │  └─────────────────┘   │  FullyReturned  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived, Not Stored
//! Two quantities are intentionally never persisted as source of truth:
//! - a customer's lifetime paid spend (summed from their invoices)
//! - a customer's tier (classified from that spend)
//!
//! Storing either redundantly is how silent financial drift starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Customer
// =============================================================================

/// A customer enrolled in the loyalty program.
///
/// ## Optimistic Concurrency
/// `version` is the per-customer transaction anchor: every committed
/// checkout, reversal, or points mutation bumps it, and a stale writer's
/// compare-and-swap fails with a Conflict. This is what keeps two
/// concurrent checkouts from both consuming the last discount-usage slot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Loyalty points balance. Never negative.
    pub points: i64,

    /// When the customer was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Optimistic-concurrency token, bumped on every committed write.
    pub version: i64,
}

impl Customer {
    /// Creates a new customer with an empty points balance.
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Customer {
            id: id.into(),
            name: name.into(),
            points: 0,
            created_at,
            version: 0,
        }
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// Which benefit an invoice carried.
///
/// At most one of {tier discount, points redemption} per invoice — the
/// single-choice [`DiscountChoice`] union enforces it at finalization, and
/// this recorded kind is what reversal later inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// No benefit applied.
    None,
    /// Tier discount (consumes a usage-window slot).
    Tier,
    /// Points redemption (consumes points).
    Points,
}

impl Default for DiscountKind {
    fn default() -> Self {
        DiscountKind::None
    }
}

// =============================================================================
// Discount Choice
// =============================================================================

/// The caller's benefit selection for a checkout, as a tagged union.
///
/// ## Why a union and not two flags?
/// Mutual exclusion between tier discount and points redemption used to be
/// scattered UI guards. A single-choice union makes the illegal state
/// (both at once) unrepresentable at the finalization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountChoice {
    /// No benefit requested.
    None,
    /// Apply the customer's tier discount (re-evaluated at commit time).
    Tier,
    /// Commit a pending points redemption of exactly this many points.
    Points { points: i64 },
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Reversal state machine per invoice.
///
/// `Active → {Cancelled | PartiallyReturned* → FullyReturned}`
///
/// PartiallyReturned is re-enterable: multiple partial returns are allowed
/// as long as the per-line returned quantity never exceeds what was bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Finalized, no reversal applied.
    Active,
    /// Fully cancelled — the transaction never happened.
    Cancelled,
    /// One or more line items partially returned.
    PartiallyReturned,
    /// Every unit of every line item returned.
    FullyReturned,
}

impl InvoiceStatus {
    /// Whether items can still be returned in this state.
    pub fn accepts_returns(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Active | InvoiceStatus::PartiallyReturned
        )
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Active
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line item on an invoice.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    /// Product reference (catalog is an external collaborator).
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Unit cost at time of sale (frozen, for margin reporting).
    pub unit_cost_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line-total discount recorded against this item.
    pub item_discount_cents: i64,
    /// Cumulative quantity already returned. Never exceeds `quantity`.
    pub returned_quantity: i64,
}

impl InvoiceItem {
    /// Creates a line item with nothing returned yet.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price_cents: i64,
        unit_cost_cents: i64,
        quantity: i64,
        item_discount_cents: i64,
    ) -> Self {
        InvoiceItem {
            product_id: product_id.into(),
            name_snapshot: name.into(),
            unit_price_cents,
            unit_cost_cents,
            quantity,
            item_discount_cents,
            returned_quantity: 0,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Quantity still eligible for return.
    #[inline]
    pub fn returnable_quantity(&self) -> i64 {
        self.quantity - self.returned_quantity
    }
}

// =============================================================================
// Return Record
// =============================================================================

/// One applied return, logged per invoice.
///
/// The log serves two purposes: it is the refund audit trail, and it is the
/// idempotence check — an exact (product, quantity) resubmission is
/// rejected rather than refunded twice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRecord {
    pub product_id: String,
    pub quantity: i64,
    /// Amount refunded for this return.
    pub refund_cents: i64,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized sale with its loyalty/discount/debt linkage.
///
/// ## Reversal Linkage
/// Everything a later cancellation or return needs to undo is recorded
/// here at finalize time: which benefit was applied (`discount_kind`,
/// `discount_cents`, `points_redeemed`), what was accrued
/// (`points_earned`), and the debt reference (`debt_id`). Reversal never
/// has to guess.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
    /// Invoice date — the instant used for usage-window counting.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<InvoiceItem>,
    /// Sum of line totals before any benefit.
    pub subtotal_cents: i64,
    /// Benefit amount deducted from the subtotal (0 if none).
    pub discount_cents: i64,
    /// Which benefit produced `discount_cents`.
    pub discount_kind: DiscountKind,
    /// Points consumed when `discount_kind == Points` (0 otherwise).
    pub points_redeemed: i64,
    /// Amount the customer actually paid at checkout.
    pub amount_paid_cents: i64,
    /// Points accrued from the paid portion at finalize time.
    pub points_earned: i64,
    /// Cumulative points clawed back by partial returns.
    pub points_reversed: i64,
    /// Cumulative amount refunded by partial returns.
    pub refunded_cents: i64,
    /// Applied returns, in application order.
    pub returns: Vec<ReturnRecord>,
    /// Linked debt record, if the invoice was underpaid.
    pub debt_id: Option<String>,
    pub status: InvoiceStatus,
    /// Optimistic-concurrency token.
    pub version: i64,
}

impl Invoice {
    /// Current total: subtotal − benefit − refunds, floored at zero.
    pub fn total(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
            .saturating_sub(Money::from_cents(self.discount_cents))
            .saturating_sub(Money::from_cents(self.refunded_cents))
    }

    /// Total at finalize time, before any returns.
    pub fn original_total(&self) -> Money {
        Money::from_cents(self.subtotal_cents).saturating_sub(Money::from_cents(self.discount_cents))
    }

    /// Derived unpaid remainder: max(0, total − amount paid).
    pub fn debt_amount(&self) -> Money {
        self.total()
            .saturating_sub(Money::from_cents(self.amount_paid_cents))
    }

    /// The portion of the total the customer actually paid.
    /// Points accrue on this, never on the debt portion.
    pub fn paid_portion(&self) -> Money {
        Money::from_cents(self.amount_paid_cents.min(self.original_total().cents()))
    }

    /// Looks up a line item by product id.
    pub fn item(&self, product_id: &str) -> Option<&InvoiceItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// True when every unit of every line item has been returned.
    pub fn all_items_returned(&self) -> bool {
        self.items.iter().all(|i| i.returnable_quantity() == 0)
    }
}

// =============================================================================
// Debt
// =============================================================================

/// Debt status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Balance outstanding.
    Open,
    /// Remaining amount reached zero.
    Settled,
}

/// The unpaid remainder of an invoice, tracked as a mutable balance.
///
/// ## Invariant
/// `remaining_cents == original_cents − sum(payments)` at all times, and
/// `remaining_cents == 0 ⇔ status == Settled`. Return adjustments shrink
/// `original_cents` and `remaining_cents` together, which preserves the
/// equation without fabricating a payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Debt {
    pub id: String,
    pub customer_id: String,
    pub invoice_id: String,
    /// Amount originally owed (reduced only by return adjustments).
    pub original_cents: i64,
    /// Amount still owed. Never negative.
    pub remaining_cents: i64,
    pub status: DebtStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency token.
    pub version: i64,
}

impl Debt {
    /// Returns the remaining balance as Money.
    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    /// Returns the original amount as Money.
    #[inline]
    pub fn original(&self) -> Money {
        Money::from_cents(self.original_cents)
    }

    /// True once the balance is fully paid or adjusted away.
    #[inline]
    pub fn is_settled(&self) -> bool {
        matches!(self.status, DebtStatus::Settled)
    }
}

// =============================================================================
// Debt Payment
// =============================================================================

/// A payment applied to a debt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtPayment {
    pub debt_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    /// Cashier/operator who recorded the payment.
    pub recorded_by: String,
}

// =============================================================================
// Debt History
// =============================================================================

/// Kind of debt-history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DebtHistoryKind {
    CreateDebt,
    Payment,
}

/// One append-only debt-history row.
///
/// History is never mutated and never deleted — with a single, explicit
/// exception: full invoice cancellation removes the debt *and* its history,
/// because a cancelled transaction is defined as never having happened.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtHistoryEntry {
    pub debt_id: String,
    pub customer_id: String,
    pub invoice_id: String,
    pub kind: DebtHistoryKind,
    /// Created amount for CreateDebt, payment amount for Payment.
    pub amount_cents: i64,
    /// Remaining balance immediately after this event.
    pub remaining_after_cents: i64,
    #[ts(as = "String")]
    pub at: DateTime<Utc>,
    /// Who triggered the event.
    pub actor: String,
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// Checkout input: what the caller wants finalized.
///
/// The engine treats every field as untrusted — the discount decision is
/// re-evaluated and the redemption re-validated inside the commit cycle.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceDraft {
    pub customer_id: String,
    pub items: Vec<InvoiceItem>,
    pub discount: DiscountChoice,
    pub amount_paid_cents: i64,
}

impl InvoiceDraft {
    /// Candidate subtotal: sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, i| acc + i.line_total())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
