//! # Debt Operations
//!
//! Payment recording against open debts, and the customer history query.
//!
//! Payments serialize per debt id and commit through the versioned debt
//! write; an overpayment is rejected with the current remaining balance in
//! the error so the caller can re-present an amount that fits.

use tracing::info;

use meridian_core::debt::apply_payment;
use meridian_core::validation::{validate_actor, validate_entity_id, validate_payment_amount};
use meridian_core::{Debt, DebtHistoryEntry, DebtPayment};
use meridian_store::Store;

use crate::error::EngineResult;
use crate::sync::with_conflict_retry;
use crate::Engine;

impl<S: Store> Engine<S> {
    /// Records a payment against a debt.
    ///
    /// ## Failure Modes
    /// - amount ≤ 0, empty actor, malformed id → Validation
    /// - unknown debt → NotFound
    /// - amount exceeds the remaining balance (including any payment
    ///   against a settled debt) → LimitExceeded, never clamped
    pub fn record_debt_payment(
        &self,
        debt_id: &str,
        amount_cents: i64,
        actor: &str,
    ) -> EngineResult<Debt> {
        validate_entity_id("debt_id", debt_id)?;
        validate_payment_amount(amount_cents)?;
        validate_actor(actor)?;

        let lock = self.locks.acquire(debt_id);
        let _guard = lock.lock().expect("debt lock poisoned");

        with_conflict_retry(|| {
            let mut debt = self.store.debt(debt_id)?;
            let expected_version = debt.version;

            let payment = DebtPayment {
                debt_id: debt_id.to_string(),
                amount_cents,
                paid_at: self.clock.now(),
                recorded_by: actor.trim().to_string(),
            };
            let entry = apply_payment(&mut debt, &payment)?;

            debt.version = self.store.update_debt(&debt, expected_version)?;
            self.store.append_history(&entry)?;

            info!(
                debt_id,
                amount = amount_cents,
                remaining = debt.remaining_cents,
                status = ?debt.status,
                actor = %payment.recorded_by,
                "Recorded debt payment"
            );
            Ok(debt)
        })
    }

    /// The customer's debt history, newest first.
    ///
    /// A finite snapshot — callers refresh by calling again, there is no
    /// cursor to hold.
    pub fn debt_history(&self, customer_id: &str) -> EngineResult<Vec<DebtHistoryEntry>> {
        validate_entity_id("customer_id", customer_id)?;
        Ok(self.store.history_for_customer(customer_id)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
