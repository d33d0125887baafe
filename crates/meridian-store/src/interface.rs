//! # Store Traits
//!
//! The storage interface the loyalty engine is written against. Each trait
//! models one external collaborator; real persistence lives outside this
//! workspace and implements these seams.
//!
//! ## Optimistic Concurrency Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutation is a read-modify-write cycle:                           │
//! │                                                                         │
//! │  1. read record (carries `version`)                                    │
//! │  2. mutate a local copy                                                 │
//! │  3. update_*(record, expected_version)                                 │
//! │       ├── stored version == expected → write, bump, return new version │
//! │       └── mismatch → StoreError::Conflict (caller re-reads, retries)   │
//! │                                                                         │
//! │  Keyed by customer_id for points/discount-usage mutations and by       │
//! │  debt_id for payment application.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All methods are synchronous: the engine never blocks on I/O internally,
//! and storage atomicity per call is the implementor's concern.

use chrono::{DateTime, Utc};

use meridian_core::{Customer, Debt, DebtHistoryEntry, Invoice};

use crate::error::StoreResult;

/// Half-open `[start, end)` instant range for invoice queries.
pub type DateRange = (DateTime<Utc>, DateTime<Utc>);

// =============================================================================
// Customer Store
// =============================================================================

/// Customer records: points balance and the per-customer version that
/// anchors checkout serialization.
pub trait CustomerStore {
    /// Fetches a customer by id.
    fn customer(&self, id: &str) -> StoreResult<Customer>;

    /// Inserts a new customer. Fails on duplicate id.
    fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;

    /// Versioned write. Returns the new version on success.
    fn update_customer(&self, customer: &Customer, expected_version: i64) -> StoreResult<i64>;
}

// =============================================================================
// Invoice Store
// =============================================================================

/// Invoice records and the customer-scoped queries the discount window
/// counting depends on.
pub trait InvoiceStore {
    /// Fetches an invoice by id.
    fn invoice(&self, id: &str) -> StoreResult<Invoice>;

    /// Customer-scoped invoice query, optionally bounded to a date range.
    ///
    /// This is the indexed `(customer_id, window)` lookup that replaces the
    /// storefront's old scan-everything-per-render behavior. Implementors
    /// should index accordingly.
    fn invoices_for_customer(
        &self,
        customer_id: &str,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<Invoice>>;

    /// Inserts a finalized invoice. Fails on duplicate id.
    fn insert_invoice(&self, invoice: &Invoice) -> StoreResult<()>;

    /// Versioned write. Returns the new version on success.
    fn update_invoice(&self, invoice: &Invoice, expected_version: i64) -> StoreResult<i64>;

    /// Lifetime paid spend: sum of `amount_paid` over the customer's
    /// non-cancelled invoices. Derived here, never stored redundantly.
    fn lifetime_paid_spend(&self, customer_id: &str) -> StoreResult<i64>;
}

// =============================================================================
// Debt Store
// =============================================================================

/// Debt balances plus their append-only history.
pub trait DebtStore {
    /// Fetches a debt by id.
    fn debt(&self, id: &str) -> StoreResult<Debt>;

    /// Fetches the debt linked to an invoice, if any.
    fn debt_for_invoice(&self, invoice_id: &str) -> StoreResult<Option<Debt>>;

    /// Inserts a new debt. Fails on duplicate id.
    fn insert_debt(&self, debt: &Debt) -> StoreResult<()>;

    /// Versioned write. Returns the new version on success.
    fn update_debt(&self, debt: &Debt, expected_version: i64) -> StoreResult<i64>;

    /// Removes a debt AND its history rows.
    ///
    /// Only invoked by full cancellation — the one sanctioned exception to
    /// the append-only history rule.
    fn delete_debt(&self, id: &str) -> StoreResult<()>;

    /// Appends one history row.
    fn append_history(&self, entry: &DebtHistoryEntry) -> StoreResult<()>;

    /// Customer's debt history, newest first.
    ///
    /// Each call re-queries: the result is a finite snapshot, restartable
    /// by calling again, not a live cursor.
    fn history_for_customer(&self, customer_id: &str) -> StoreResult<Vec<DebtHistoryEntry>>;
}

// =============================================================================
// Inventory
// =============================================================================

/// The external inventory collaborator. The engine only ever puts stock
/// back (cancellations and returns); selling stock is checkout plumbing
/// outside this workspace.
pub trait Inventory {
    fn restock(&self, product_id: &str, quantity: i64) -> StoreResult<()>;
}

// =============================================================================
// Combined Store
// =============================================================================

/// Everything the engine needs, as one bound.
///
/// Blanket-implemented so any type providing the four collaborator traits
/// is usable as an engine store.
pub trait Store: CustomerStore + InvoiceStore + DebtStore + Inventory {}

impl<T: CustomerStore + InvoiceStore + DebtStore + Inventory> Store for T {}
