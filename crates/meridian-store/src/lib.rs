//! # meridian-store: Storage Abstraction for Meridian POS
//!
//! This crate owns the storage interface of the loyalty engine. Real
//! persistence is an external collaborator of the product; the engine is
//! written against the traits defined here and never touches a concrete
//! datastore.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        meridian-store                                   │
//! │                                                                         │
//! │  ┌──────────────────┐    ┌──────────────────────────────────────────┐  │
//! │  │  interface       │    │  memory                                  │  │
//! │  │  ─────────────   │    │  ─────────────                           │  │
//! │  │  CustomerStore   │◄───│  MemoryStore: Mutex<HashMap> maps with   │  │
//! │  │  InvoiceStore    │    │  versioned compare-and-swap updates.     │  │
//! │  │  DebtStore       │    │  Backs every engine test; reference      │  │
//! │  │  Inventory       │    │  semantics for real implementations.     │  │
//! │  │  Store (all 4)   │    └──────────────────────────────────────────┘  │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`interface`] - Store traits and the optimistic-concurrency contract
//! - [`memory`] - In-memory reference implementation
//! - [`error`] - NotFound/Conflict/Duplicate taxonomy

pub mod error;
pub mod interface;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use interface::{CustomerStore, DateRange, DebtStore, Inventory, InvoiceStore, Store};
pub use memory::MemoryStore;
