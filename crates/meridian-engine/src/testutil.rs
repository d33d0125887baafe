//! Shared fixtures for engine operation tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use meridian_core::{
    Customer, DiscountChoice, DiscountKind, Invoice, InvoiceDraft, InvoiceItem, InvoiceStatus,
    Milestone, Percentage, PointsPolicy, Tier, TierCatalog, UsageLimit, WindowKind,
};
use meridian_store::{CustomerStore, InvoiceStore, MemoryStore};

use crate::clock::ManualClock;
use crate::Engine;

/// The seeded test customer.
pub(crate) const CUSTOMER_ID: &str = "3f0a1d2e-5b6c-4d7e-8f90-1a2b3c4d5e6f";

/// Wires test log output when RUST_LOG is set.
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Saturday 2026-08-08, mid-morning.
pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap()
}

/// The "Nông dân" tier: 5% discount, once per month, no minimum order,
/// 1.0× points. Threshold 1,000,000 lifetime spend.
pub(crate) fn catalog() -> TierCatalog {
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

/// 1 point per 100 units paid; two milestones.
pub(crate) fn policy() -> PointsPolicy {
    PointsPolicy::new(
        Percentage::from_bps(100),
        vec![Milestone::new(100, 10_000), Milestone::new(500, 60_000)],
    )
}

/// Engine over a MemoryStore seeded with one customer whose prior paid
/// spend (2,000,000 in January) puts them in the "Nông dân" tier without
/// touching any August usage window.
pub(crate) fn engine() -> (Arc<ManualClock>, Engine<MemoryStore>) {
    init_logging();

    let clock = Arc::new(ManualClock::new(start()));
    let store = MemoryStore::new();

    let enrolled = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    store
        .insert_customer(&Customer::new(CUSTOMER_ID, "Bác Ba", enrolled))
        .unwrap();

    store
        .insert_invoice(&Invoice {
            id: "9b8c7d6e-5f40-4132-a2b3-c4d5e6f70819".to_string(),
            customer_id: CUSTOMER_ID.to_string(),
            date: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            items: vec![InvoiceItem::new("p-feed", "Feed 20kg", 2_000_000, 1_500_000, 1, 0)],
            subtotal_cents: 2_000_000,
            discount_cents: 0,
            discount_kind: DiscountKind::None,
            points_redeemed: 0,
            amount_paid_cents: 2_000_000,
            points_earned: 0,
            points_reversed: 0,
            refunded_cents: 0,
            returns: Vec::new(),
            debt_id: None,
            status: InvoiceStatus::Active,
            version: 0,
        })
        .unwrap();

    let engine = Engine::new(store, catalog(), policy()).with_clock(clock.clone());
    (clock, engine)
}

pub(crate) fn item(product_id: &str, qty: i64, unit_price: i64, line_discount: i64) -> InvoiceItem {
    InvoiceItem::new(product_id, format!("Product {product_id}"), unit_price, 0, qty, line_discount)
}

pub(crate) fn draft(items: Vec<InvoiceItem>, discount: DiscountChoice, paid: i64) -> InvoiceDraft {
    InvoiceDraft {
        customer_id: CUSTOMER_ID.to_string(),
        items,
        discount,
        amount_paid_cents: paid,
    }
}
