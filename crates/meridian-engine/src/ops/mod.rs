//! # Engine Operations
//!
//! The public operation surface, one module per concern:
//!
//! - [`checkout`] - discount evaluation, point redemption, finalization
//! - [`debt`] - payment recording and history queries
//! - [`reversal`] - cancellation and partial returns

pub mod checkout;
pub mod debt;
pub mod reversal;
