//! # Reversal Operations
//!
//! Full cancellation and partial line-item returns.
//!
//! ## All-Or-Nothing Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every reversal validates COMPLETELY before its first side effect:      │
//! │  the return plan is computed pure, then commits in an order that        │
//! │  keeps a conflicted cycle restartable from scratch.                     │
//! │                                                                         │
//! │  return_items commit order:                                             │
//! │    1. debt CAS        ← the only record a concurrent payment can touch │
//! │    2. customer CAS      (in-process races are excluded by the          │
//! │    3. invoice CAS        per-customer lock held for 2–4)               │
//! │    4. restock           (external side effect last)                    │
//! │                                                                         │
//! │  A debt conflict in step 1 aborts with nothing applied; the bounded    │
//! │  retry re-reads and re-plans. Cross-record atomicity of 2–4 is the     │
//! │  storage collaborator's contract.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation vs Return
//! Cancellation means "this transaction never happened": stock comes back,
//! the debt AND its history are deleted, accrued points are clawed back,
//! redeemed points are restored, and the discount-usage slot frees up
//! (cancelled invoices drop out of window counting). A partial return
//! refunds quantity-accurately but deliberately does NOT restore the usage
//! slot.

use tracing::info;

use meridian_core::debt::apply_return_adjustment;
use meridian_core::reversal::{apply_return, net_points_delta_on_cancellation, plan_return};
use meridian_core::validation::validate_entity_id;
use meridian_core::{CoreError, InvoiceStatus, Money, RefundResult, ReturnRequest};
use meridian_store::Store;

use crate::error::EngineResult;
use crate::sync::with_conflict_retry;
use crate::Engine;

impl<S: Store> Engine<S> {
    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Cancels an Active invoice in full.
    ///
    /// Restocks every line, deletes the linked debt and its history,
    /// claws back accrued points, restores redeemed points, and frees the
    /// consumed discount-usage slot. Only Active invoices can be
    /// cancelled — once items have been returned, the remainder must be
    /// returned, not cancelled.
    pub fn cancel_invoice(&self, invoice_id: &str) -> EngineResult<()> {
        validate_entity_id("invoice_id", invoice_id)?;

        // Read once outside the lock to learn the owning customer
        let owner = self.store.invoice(invoice_id)?.customer_id;
        let lock = self.locks.acquire(&owner);
        let _guard = lock.lock().expect("customer lock poisoned");

        with_conflict_retry(|| self.cancel_cycle(invoice_id))
    }

    fn cancel_cycle(&self, invoice_id: &str) -> EngineResult<()> {
        let mut invoice = self.store.invoice(invoice_id)?;
        if invoice.status != InvoiceStatus::Active {
            return Err(CoreError::InvalidInvoiceStatus {
                invoice_id: invoice.id.clone(),
                status: format!("{:?}", invoice.status),
            }
            .into());
        }
        let customer = self.store.customer(&invoice.customer_id)?;

        // Balance saturates at zero: a customer who already spent the
        // accrued points cannot go negative
        let delta = net_points_delta_on_cancellation(&invoice);
        let mut updated = customer.clone();
        updated.points = (customer.points + delta).max(0);

        let had_debt = invoice.debt_id.is_some();
        if let Some(debt_id) = invoice.debt_id.take() {
            self.store.delete_debt(&debt_id)?;
        }

        let expected_version = invoice.version;
        invoice.status = InvoiceStatus::Cancelled;

        self.store.update_customer(&updated, customer.version)?;
        self.store.update_invoice(&invoice, expected_version)?;

        for item in &invoice.items {
            self.store.restock(&item.product_id, item.quantity)?;
        }

        info!(
            invoice_id,
            customer_id = %invoice.customer_id,
            points_delta = delta,
            had_debt,
            "Cancelled invoice"
        );
        Ok(())
    }

    // =========================================================================
    // Partial Returns
    // =========================================================================

    /// Returns quantities of line items from an invoice.
    ///
    /// Quantity-accurate and idempotent: cumulative returned quantity per
    /// line never exceeds what was bought, and resubmitting an identical
    /// (product, quantity) request is rejected rather than refunded twice.
    /// The refund first shrinks any linked debt; the remainder
    /// (`refund_cents − debt_reduced_cents`) is owed to the customer in
    /// cash.
    pub fn return_items(
        &self,
        invoice_id: &str,
        items: &[ReturnRequest],
    ) -> EngineResult<RefundResult> {
        validate_entity_id("invoice_id", invoice_id)?;

        let owner = self.store.invoice(invoice_id)?.customer_id;
        let lock = self.locks.acquire(&owner);
        let _guard = lock.lock().expect("customer lock poisoned");

        with_conflict_retry(|| self.return_cycle(invoice_id, items))
    }

    fn return_cycle(&self, invoice_id: &str, items: &[ReturnRequest]) -> EngineResult<RefundResult> {
        let mut invoice = self.store.invoice(invoice_id)?;
        let customer = self.store.customer(&invoice.customer_id)?;

        // All validation happens here, before any side effect
        let plan = plan_return(&invoice, items)?;
        let now = self.clock.now();

        // Debt first: the one record a concurrent payment can also touch.
        // A version conflict aborts this cycle with nothing applied.
        let mut debt_reduced = Money::zero();
        if let Some(debt_id) = &invoice.debt_id {
            let mut debt = self.store.debt(debt_id)?;
            let expected_version = debt.version;
            debt_reduced = apply_return_adjustment(&mut debt, Money::from_cents(plan.refund_cents));
            if debt_reduced.is_positive() {
                self.store.update_debt(&debt, expected_version)?;
            }
        }

        let invoice_version = invoice.version;
        apply_return(&mut invoice, &plan, now);

        let mut updated = customer.clone();
        updated.points = (customer.points - plan.points_reversal).max(0);

        self.store.update_customer(&updated, customer.version)?;
        self.store.update_invoice(&invoice, invoice_version)?;

        for line in &plan.lines {
            self.store.restock(&line.product_id, line.quantity)?;
        }

        info!(
            invoice_id,
            customer_id = %invoice.customer_id,
            refund = plan.refund_cents,
            debt_reduced = debt_reduced.cents(),
            points_reversed = plan.points_reversal,
            status = ?invoice.status,
            "Returned items"
        );

        Ok(RefundResult {
            invoice_id: invoice.id.clone(),
            lines: plan.lines,
            refund_cents: plan.refund_cents,
            debt_reduced_cents: debt_reduced.cents(),
            points_reversed: plan.points_reversal,
            status: invoice.status,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::EngineError;
    use crate::testutil::{self, CUSTOMER_ID};
    use meridian_core::{
        CoreError, DiscountChoice, ErrorKind, InvoiceStatus, ReturnRequest,
    };
    use meridian_store::{CustomerStore, DebtStore, InvoiceStore};

    fn request(product_id: &str, qty: i64) -> Vec<ReturnRequest> {
        vec![ReturnRequest {
            product_id: product_id.to_string(),
            quantity: qty,
        }]
    }

    #[test]
    fn test_cancellation_undoes_everything() {
        let (_clock, engine) = testutil::engine();

        // Tier-discounted, underpaid: total 190000, paid 90000, debt 100000
        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 4, 50_000, 0)],
                DiscountChoice::Tier,
                90_000,
            ))
            .unwrap();
        let debt_id = invoice.debt_id.clone().unwrap();
        assert_eq!(invoice.points_earned, 900);
        assert!(!engine.evaluate_discount(CUSTOMER_ID, 200_000).unwrap().approved);

        engine.cancel_invoice(&invoice.id).unwrap();

        let stored = engine.store().invoice(&invoice.id).unwrap();
        assert_eq!(stored.status, InvoiceStatus::Cancelled);

        // Debt and its history are gone — the transaction never happened
        assert_eq!(engine.store().debt(&debt_id).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(engine.debt_history(CUSTOMER_ID).unwrap().is_empty());

        // Stock back on the shelf, points clawed back
        assert_eq!(engine.store().stock_level("p-rice"), 4);
        assert_eq!(engine.store().customer(CUSTOMER_ID).unwrap().points, 0);

        // The usage slot is free again
        assert!(engine.evaluate_discount(CUSTOMER_ID, 200_000).unwrap().approved);

        // Cancellation is not re-enterable
        let err = engine.cancel_invoice(&invoice.id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidInvoiceStatus { .. })
        ));
    }

    #[test]
    fn test_cancellation_restores_redeemed_points() {
        let (_clock, engine) = testutil::engine();

        let mut customer = engine.store().customer(CUSTOMER_ID).unwrap();
        customer.points = 600;
        engine.store().update_customer(&customer, 0).unwrap();

        engine.redeem_points(CUSTOMER_ID, 500).unwrap();
        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 4, 50_000, 0)],
                DiscountChoice::Points { points: 500 },
                140_000,
            ))
            .unwrap();
        // 600 − 500 + 1400 earned
        assert_eq!(engine.store().customer(CUSTOMER_ID).unwrap().points, 1500);

        engine.cancel_invoice(&invoice.id).unwrap();

        // Earned points leave, redeemed points come back: 1500 − 1400 + 500
        assert_eq!(engine.store().customer(CUSTOMER_ID).unwrap().points, 600);
    }

    /// Spec scenario: 3 units at 50000 with a 30000 line discount.
    /// Returning 1 refunds 60000, returning the remaining 2 refunds
    /// 120000, a third attempt is rejected.
    #[test]
    fn test_partial_return_sequence() {
        let (_clock, engine) = testutil::engine();

        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 3, 50_000, 30_000)],
                DiscountChoice::None,
                150_000,
            ))
            .unwrap();
        assert_eq!(invoice.points_earned, 1500);

        let first = engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap();
        assert_eq!(first.refund_cents, 60_000);
        assert_eq!(first.status, InvoiceStatus::PartiallyReturned);
        // floor(1500 × 60000 / 150000)
        assert_eq!(first.points_reversed, 600);
        assert_eq!(engine.store().customer(CUSTOMER_ID).unwrap().points, 900);
        assert_eq!(engine.store().stock_level("p-rice"), 1);

        let second = engine.return_items(&invoice.id, &request("p-rice", 2)).unwrap();
        assert_eq!(second.refund_cents, 120_000);
        assert_eq!(second.status, InvoiceStatus::FullyReturned);
        // Prorated 1200 but capped at the 900 still reversible
        assert_eq!(second.points_reversed, 900);
        assert_eq!(engine.store().customer(CUSTOMER_ID).unwrap().points, 0);
        assert_eq!(engine.store().stock_level("p-rice"), 3);

        let err = engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidInvoiceStatus { .. })
        ));
    }

    #[test]
    fn test_return_shrinks_linked_debt_before_cash() {
        let (_clock, engine) = testutil::engine();

        // Total 200000, paid 50000 → debt 150000; points on paid portion
        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 4, 50_000, 0)],
                DiscountChoice::None,
                50_000,
            ))
            .unwrap();
        let debt_id = invoice.debt_id.clone().unwrap();

        // Refund 100000: fully absorbed by the debt, no cash owed
        let first = engine.return_items(&invoice.id, &request("p-rice", 2)).unwrap();
        assert_eq!(first.refund_cents, 100_000);
        assert_eq!(first.debt_reduced_cents, 100_000);

        let debt = engine.store().debt(&debt_id).unwrap();
        assert_eq!(debt.remaining_cents, 50_000);
        assert_eq!(debt.original_cents, 50_000);

        // Refund 100000 against 50000 of debt: rest is a cash refund
        let second = engine.return_items(&invoice.id, &request("p-rice", 2)).unwrap();
        assert_eq!(second.refund_cents, 100_000);
        assert_eq!(second.debt_reduced_cents, 50_000);
        assert_eq!(second.status, InvoiceStatus::FullyReturned);

        let debt = engine.store().debt(&debt_id).unwrap();
        assert!(debt.is_settled());
        assert_eq!(debt.remaining_cents, 0);
    }

    #[test]
    fn test_duplicate_return_request_rejected() {
        let (_clock, engine) = testutil::engine();

        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 3, 50_000, 0)],
                DiscountChoice::None,
                150_000,
            ))
            .unwrap();

        engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap();
        let before = engine.store().invoice(&invoice.id).unwrap();

        let err = engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::AlreadyReturned { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Nothing was applied by the rejected request
        let after = engine.store().invoice(&invoice.id).unwrap();
        assert_eq!(after.refunded_cents, before.refunded_cents);
        assert_eq!(after.returns.len(), before.returns.len());
        assert_eq!(engine.store().stock_level("p-rice"), 1);
    }

    #[test]
    fn test_return_rejected_on_cancelled_invoice() {
        let (_clock, engine) = testutil::engine();

        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 2, 50_000, 0)],
                DiscountChoice::None,
                100_000,
            ))
            .unwrap();
        engine.cancel_invoice(&invoice.id).unwrap();

        let err = engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidInvoiceStatus { .. })
        ));
    }

    #[test]
    fn test_cancel_rejected_after_partial_return() {
        let (_clock, engine) = testutil::engine();

        let invoice = engine
            .finalize_invoice(&testutil::draft(
                vec![testutil::item("p-rice", 3, 50_000, 0)],
                DiscountChoice::None,
                150_000,
            ))
            .unwrap();
        engine.return_items(&invoice.id, &request("p-rice", 1)).unwrap();

        let err = engine.cancel_invoice(&invoice.id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidInvoiceStatus { .. })
        ));
    }

    #[test]
    fn test_unknown_invoice_is_not_found() {
        let (_clock, engine) = testutil::engine();
        let err = engine
            .return_items("00000000-0000-4000-8000-000000000000", &request("p-rice", 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = engine
            .cancel_invoice("00000000-0000-4000-8000-000000000000")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
