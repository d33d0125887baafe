//! # In-Memory Store
//!
//! Reference implementation of the store traits over mutex-guarded maps.
//!
//! ## Thread Safety
//! Each collection is wrapped in its own `Mutex` because:
//! 1. Engine operations may run from concurrent request handlers
//! 2. Only one writer should touch a collection at a time
//! 3. Locks are held only for the duration of a single trait call
//!
//! The versioned `update_*` methods give the same compare-and-swap
//! semantics a real store provides with `WHERE version = ?` updates: a
//! stale writer gets `Conflict`, never a silent overwrite.
//!
//! This store backs every engine test and doubles as the reference
//! semantics for real persistence implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use meridian_core::{Customer, Debt, DebtHistoryEntry, Invoice, InvoiceStatus};

use crate::error::{StoreError, StoreResult};
use crate::interface::{CustomerStore, DateRange, DebtStore, Inventory, InvoiceStore};

/// Mutex-guarded in-memory implementation of all store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: Mutex<HashMap<String, Customer>>,
    invoices: Mutex<HashMap<String, Invoice>>,
    debts: Mutex<HashMap<String, Debt>>,
    history: Mutex<Vec<DebtHistoryEntry>>,
    stock: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Current stock level for a product (0 if never restocked).
    ///
    /// Test observability: the engine only ever adds stock back, so this
    /// reads how much a cancellation/return put on the shelf.
    pub fn stock_level(&self, product_id: &str) -> i64 {
        self.stock
            .lock()
            .expect("stock mutex poisoned")
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of history rows across all debts. Test observability.
    pub fn history_len(&self) -> usize {
        self.history.lock().expect("history mutex poisoned").len()
    }
}

// =============================================================================
// CustomerStore
// =============================================================================

impl CustomerStore for MemoryStore {
    fn customer(&self, id: &str) -> StoreResult<Customer> {
        self.customers
            .lock()
            .expect("customers mutex poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Customer", id))
    }

    fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut map = self.customers.lock().expect("customers mutex poisoned");
        if map.contains_key(&customer.id) {
            return Err(StoreError::duplicate("Customer", &customer.id));
        }
        map.insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    fn update_customer(&self, customer: &Customer, expected_version: i64) -> StoreResult<i64> {
        let mut map = self.customers.lock().expect("customers mutex poisoned");
        let stored = map
            .get_mut(&customer.id)
            .ok_or_else(|| StoreError::not_found("Customer", &customer.id))?;

        if stored.version != expected_version {
            debug!(
                customer_id = %customer.id,
                stored = stored.version,
                expected = expected_version,
                "Customer version mismatch"
            );
            return Err(StoreError::conflict("Customer", &customer.id));
        }

        let new_version = expected_version + 1;
        *stored = Customer {
            version: new_version,
            ..customer.clone()
        };
        Ok(new_version)
    }
}

// =============================================================================
// InvoiceStore
// =============================================================================

impl InvoiceStore for MemoryStore {
    fn invoice(&self, id: &str) -> StoreResult<Invoice> {
        self.invoices
            .lock()
            .expect("invoices mutex poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Invoice", id))
    }

    fn invoices_for_customer(
        &self,
        customer_id: &str,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<Invoice>> {
        let map = self.invoices.lock().expect("invoices mutex poisoned");
        let mut result: Vec<Invoice> = map
            .values()
            .filter(|inv| inv.customer_id == customer_id)
            .filter(|inv| match range {
                // Half-open: [start, end)
                Some((start, end)) => start <= inv.date && inv.date < end,
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(result)
    }

    fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        debug!(invoice_id = %invoice.id, customer_id = %invoice.customer_id, "Inserting invoice");

        let mut map = self.invoices.lock().expect("invoices mutex poisoned");
        if map.contains_key(&invoice.id) {
            return Err(StoreError::duplicate("Invoice", &invoice.id));
        }
        map.insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    fn update_invoice(&self, invoice: &Invoice, expected_version: i64) -> StoreResult<i64> {
        let mut map = self.invoices.lock().expect("invoices mutex poisoned");
        let stored = map
            .get_mut(&invoice.id)
            .ok_or_else(|| StoreError::not_found("Invoice", &invoice.id))?;

        if stored.version != expected_version {
            return Err(StoreError::conflict("Invoice", &invoice.id));
        }

        let new_version = expected_version + 1;
        *stored = Invoice {
            version: new_version,
            ..invoice.clone()
        };
        Ok(new_version)
    }

    fn lifetime_paid_spend(&self, customer_id: &str) -> StoreResult<i64> {
        let map = self.invoices.lock().expect("invoices mutex poisoned");
        Ok(map
            .values()
            .filter(|inv| {
                inv.customer_id == customer_id && inv.status != InvoiceStatus::Cancelled
            })
            .map(|inv| inv.amount_paid_cents)
            .sum())
    }
}

// =============================================================================
// DebtStore
// =============================================================================

impl DebtStore for MemoryStore {
    fn debt(&self, id: &str) -> StoreResult<Debt> {
        self.debts
            .lock()
            .expect("debts mutex poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Debt", id))
    }

    fn debt_for_invoice(&self, invoice_id: &str) -> StoreResult<Option<Debt>> {
        let map = self.debts.lock().expect("debts mutex poisoned");
        Ok(map.values().find(|d| d.invoice_id == invoice_id).cloned())
    }

    fn insert_debt(&self, debt: &Debt) -> StoreResult<()> {
        debug!(debt_id = %debt.id, invoice_id = %debt.invoice_id, amount = debt.original_cents, "Inserting debt");

        let mut map = self.debts.lock().expect("debts mutex poisoned");
        if map.contains_key(&debt.id) {
            return Err(StoreError::duplicate("Debt", &debt.id));
        }
        map.insert(debt.id.clone(), debt.clone());
        Ok(())
    }

    fn update_debt(&self, debt: &Debt, expected_version: i64) -> StoreResult<i64> {
        let mut map = self.debts.lock().expect("debts mutex poisoned");
        let stored = map
            .get_mut(&debt.id)
            .ok_or_else(|| StoreError::not_found("Debt", &debt.id))?;

        if stored.version != expected_version {
            return Err(StoreError::conflict("Debt", &debt.id));
        }

        let new_version = expected_version + 1;
        *stored = Debt {
            version: new_version,
            ..debt.clone()
        };
        Ok(new_version)
    }

    fn delete_debt(&self, id: &str) -> StoreResult<()> {
        let mut map = self.debts.lock().expect("debts mutex poisoned");
        map.remove(id)
            .ok_or_else(|| StoreError::not_found("Debt", id))?;

        // Cancellation removes the history too: the transaction never
        // happened.
        self.history
            .lock()
            .expect("history mutex poisoned")
            .retain(|e| e.debt_id != id);

        debug!(debt_id = %id, "Deleted debt and its history");
        Ok(())
    }

    fn append_history(&self, entry: &DebtHistoryEntry) -> StoreResult<()> {
        self.history
            .lock()
            .expect("history mutex poisoned")
            .push(entry.clone());
        Ok(())
    }

    fn history_for_customer(&self, customer_id: &str) -> StoreResult<Vec<DebtHistoryEntry>> {
        let history = self.history.lock().expect("history mutex poisoned");
        let mut result: Vec<DebtHistoryEntry> = history
            .iter()
            .filter(|e| e.customer_id == customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.at.cmp(&a.at));
        Ok(result)
    }
}

// =============================================================================
// Inventory
// =============================================================================

impl Inventory for MemoryStore {
    fn restock(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        debug!(product_id = %product_id, quantity, "Restocking");
        *self
            .stock
            .lock()
            .expect("stock mutex poisoned")
            .entry(product_id.to_string())
            .or_insert(0) += quantity;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
