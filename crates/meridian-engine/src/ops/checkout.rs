//! # Checkout Operations
//!
//! Discount evaluation, point redemption, and invoice finalization.
//!
//! ## Finalization Commit Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  finalize_invoice(draft)          [per-customer lock held throughout]  │
//! │                                                                         │
//! │  1. read customer (version V)                                          │
//! │  2. resolve benefit                                                     │
//! │     ├── Tier   → RE-evaluate discount against current window history   │
//! │     ├── Points → pending quote must exist and re-validate balance      │
//! │     └── None                                                            │
//! │  3. total = subtotal − benefit;  debt = total − paid (if positive)     │
//! │  4. accrue points on min(paid, total)                                  │
//! │  5. update_customer(…, expected V) ──► Conflict? re-run from step 1    │
//! │  6. insert invoice, insert debt + history, clear pending redemption    │
//! │                                                                         │
//! │  The customer CAS in step 5 is the serialization anchor: a competing   │
//! │  checkout that already committed bumped V, so this cycle re-reads and  │
//! │  recounts the usage window before it can consume a stale slot.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::info;
use uuid::Uuid;

use chrono::{DateTime, Utc};

use meridian_core::debt::open_debt;
use meridian_core::validation::{
    validate_amount_paid, validate_entity_id, validate_points_amount, validate_quantity,
};
use meridian_core::{
    Customer, DiscountCalculator, DiscountChoice, DiscountDecision, DiscountKind, Invoice,
    InvoiceDraft, InvoiceItem, InvoiceStatus, Money, RedemptionQuote, UsageWindow,
    ValidationError,
};
use meridian_store::Store;

use crate::error::{EngineError, EngineResult};
use crate::sync::with_conflict_retry;
use crate::Engine;

impl<S: Store> Engine<S> {
    // =========================================================================
    // Discount Evaluation (advisory)
    // =========================================================================

    /// Evaluates the customer's tier discount for a candidate subtotal.
    ///
    /// Advisory: approval does not reserve the usage slot. The slot is
    /// consumed only when `finalize_invoice` commits, which re-runs this
    /// evaluation under the customer lock.
    pub fn evaluate_discount(
        &self,
        customer_id: &str,
        subtotal_cents: i64,
    ) -> EngineResult<DiscountDecision> {
        validate_entity_id("customer_id", customer_id)?;

        let customer = self.store.customer(customer_id)?;
        self.evaluate_for(&customer, Money::from_cents(subtotal_cents), self.clock.now())
    }

    /// Shared evaluation path: derives lifetime spend, pulls the
    /// window-scoped invoice history, and runs the calculator.
    pub(crate) fn evaluate_for(
        &self,
        customer: &Customer,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> EngineResult<DiscountDecision> {
        let spend = Money::from_cents(self.store.lifetime_paid_spend(&customer.id)?);
        let tier = self.catalog.classify(spend);

        // Indexed query scoped to (customer, window) — not a global scan
        let history = if tier.has_discount() {
            let window = UsageWindow::containing(tier.usage_limit.window, now);
            self.store
                .invoices_for_customer(&customer.id, Some((window.start, window.end)))?
        } else {
            Vec::new()
        };

        let decision = DiscountCalculator::new(&self.catalog).evaluate(
            &customer.id,
            spend,
            subtotal,
            &history,
            now,
        )?;
        Ok(decision)
    }

    // =========================================================================
    // Point Redemption (pending until finalized)
    // =========================================================================

    /// Quotes a redemption and registers it as pending for the customer.
    ///
    /// The points leave the balance only when an invoice carrying
    /// `DiscountChoice::Points` finalizes. A second redemption request
    /// while one is pending is refused — one checkout at a time per
    /// customer spends points.
    pub fn redeem_points(&self, customer_id: &str, points: i64) -> EngineResult<RedemptionQuote> {
        validate_entity_id("customer_id", customer_id)?;
        validate_points_amount(points)?;

        let customer = self.store.customer(customer_id)?;

        let mut pending = self.pending.lock().expect("pending registry poisoned");
        if pending.contains_key(customer_id) {
            return Err(EngineError::RedemptionPending {
                customer_id: customer_id.to_string(),
            });
        }

        let quote = self.points.quote_redemption(customer.points, points)?;
        pending.insert(customer_id.to_string(), quote);

        info!(
            customer_id,
            points,
            value = quote.value_cents,
            "Registered pending redemption"
        );
        Ok(quote)
    }

    /// Drops the customer's pending redemption (checkout abandoned).
    pub fn cancel_redemption(&self, customer_id: &str) -> EngineResult<()> {
        validate_entity_id("customer_id", customer_id)?;

        let removed = self
            .pending
            .lock()
            .expect("pending registry poisoned")
            .remove(customer_id);

        match removed {
            Some(_) => Ok(()),
            None => Err(EngineError::NoPendingRedemption {
                customer_id: customer_id.to_string(),
            }),
        }
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Commits a checkout: benefit, debt, and points atomically.
    pub fn finalize_invoice(&self, draft: &InvoiceDraft) -> EngineResult<Invoice> {
        validate_entity_id("customer_id", &draft.customer_id)?;
        validate_amount_paid(draft.amount_paid_cents)?;
        if draft.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        for item in &draft.items {
            validate_quantity(item.quantity)?;
            if item.unit_price_cents < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: "unit price".to_string(),
                }
                .into());
            }
            if item.item_discount_cents < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: "item discount".to_string(),
                }
                .into());
            }
        }

        let lock = self.locks.acquire(&draft.customer_id);
        let _guard = lock.lock().expect("customer lock poisoned");

        with_conflict_retry(|| self.finalize_cycle(draft))
    }

    /// One read-modify-write attempt. Re-reads everything so the bounded
    /// retry stays correct after a version conflict.
    fn finalize_cycle(&self, draft: &InvoiceDraft) -> EngineResult<Invoice> {
        let customer = self.store.customer(&draft.customer_id)?;
        let now = self.clock.now();
        let subtotal = draft.subtotal();

        let spend = Money::from_cents(self.store.lifetime_paid_spend(&customer.id)?);
        let tier = self.catalog.classify(spend);

        // Resolve the benefit. The draft's choice is a claim, not a fact:
        // the tier path recounts the window, the points path re-validates
        // the balance, both against state read inside this cycle.
        let (discount_cents, discount_kind, points_redeemed) = match &draft.discount {
            DiscountChoice::None => (0, DiscountKind::None, 0),
            DiscountChoice::Tier => {
                let decision = self.evaluate_for(&customer, subtotal, now)?;
                if !decision.approved {
                    return Err(EngineError::DiscountDenied {
                        denial: decision.denial,
                        message: decision.message,
                    });
                }
                (decision.amount_cents, DiscountKind::Tier, 0)
            }
            DiscountChoice::Points { points } => {
                let pending = self
                    .pending
                    .lock()
                    .expect("pending registry poisoned")
                    .get(&draft.customer_id)
                    .copied()
                    .ok_or_else(|| EngineError::NoPendingRedemption {
                        customer_id: draft.customer_id.clone(),
                    })?;
                if pending.points != *points {
                    return Err(EngineError::RedemptionMismatch {
                        customer_id: draft.customer_id.clone(),
                        pending: pending.points,
                        requested: *points,
                    });
                }

                let quote = self.points.quote_redemption(customer.points, *points)?;
                if quote.value_cents > subtotal.cents() {
                    return Err(ValidationError::OutOfRange {
                        field: "redemption value".to_string(),
                        min: 0,
                        max: subtotal.cents(),
                    }
                    .into());
                }
                (quote.value_cents, DiscountKind::Points, *points)
            }
        };

        let total = subtotal.saturating_sub(Money::from_cents(discount_cents));
        let paid_portion = Money::from_cents(draft.amount_paid_cents.min(total.cents()));
        let points_earned = self.points.accrual(paid_portion, tier);

        let items: Vec<InvoiceItem> = draft
            .items
            .iter()
            .map(|i| InvoiceItem {
                returned_quantity: 0,
                ..i.clone()
            })
            .collect();

        let mut invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            customer_id: draft.customer_id.clone(),
            date: now,
            items,
            subtotal_cents: subtotal.cents(),
            discount_cents,
            discount_kind,
            points_redeemed,
            amount_paid_cents: draft.amount_paid_cents,
            points_earned,
            points_reversed: 0,
            refunded_cents: 0,
            returns: Vec::new(),
            debt_id: None,
            status: InvoiceStatus::Active,
            version: 0,
        };

        let opened = open_debt(&invoice, Uuid::new_v4().to_string(), now);
        if let Some((debt, _)) = &opened {
            invoice.debt_id = Some(debt.id.clone());
        }

        // Serialization anchor: always write the customer, even when the
        // balance is unchanged, so competing checkouts collide here.
        let mut updated = customer.clone();
        updated.points = customer.points + points_earned - points_redeemed;
        self.store.update_customer(&updated, customer.version)?;

        self.store.insert_invoice(&invoice)?;
        if let Some((debt, entry)) = opened {
            self.store.insert_debt(&debt)?;
            self.store.append_history(&entry)?;
        }

        if matches!(draft.discount, DiscountChoice::Points { .. }) {
            self.pending
                .lock()
                .expect("pending registry poisoned")
                .remove(&draft.customer_id);
        }

        info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            subtotal = invoice.subtotal_cents,
            discount = invoice.discount_cents,
            kind = ?invoice.discount_kind,
            debt = invoice.debt_amount().cents(),
            points_earned,
            "Finalized invoice"
        );
        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
