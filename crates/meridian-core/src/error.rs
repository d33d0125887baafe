//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  meridian-store errors (separate crate)                                │
//! │  └── StoreError       - NotFound / version conflicts                   │
//! │                                                                         │
//! │  meridian-engine errors (separate crate)                               │
//! │  └── EngineError      - What the checkout caller sees                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → EngineError → UI     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, limits)
//! 3. Errors are enum variants, never String
//! 4. Every error classifies into an [`ErrorKind`] so the caller can decide
//!    between retry (Conflict) and user-facing denial (everything else)

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by every error type in the workspace.
///
/// The caller (UI/API layer) routes on this, not on individual variants:
/// - `Conflict` is the only kind that is safely retryable (re-read current
///   state and re-apply)
/// - `Validation` and `LimitExceeded` become user-facing denials
/// - `NotFound` is a bad reference (unknown customer/invoice/debt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing/negative amounts, over-return quantity, invalid milestone.
    Validation,
    /// Usage window exhausted, insufficient points, payment exceeds debt.
    LimitExceeded,
    /// Concurrent modification of the same customer/debt record.
    Conflict,
    /// Unknown customer/invoice/debt.
    NotFound,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are returned as
/// typed results, never thrown across module boundaries, so the caller can
/// render a localized message without a checkout ever crashing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Redemption request does not match any fixed milestone.
    #[error("No redemption milestone for {requested} points")]
    InvalidMilestone { requested: i64 },

    /// Customer's balance cannot cover the requested redemption.
    ///
    /// ## When This Occurs
    /// - Redeeming more points than the balance holds
    ///
    /// The request is denied, never clamped to the balance.
    #[error("Insufficient points: balance {balance}, requested {requested}")]
    InsufficientPoints { balance: i64, requested: i64 },

    /// Payment would exceed the remaining debt balance.
    ///
    /// ## When This Occurs
    /// - Paying more than `remaining_amount` (rejected, not clamped)
    /// - Any positive payment against a settled debt (remaining is zero)
    ///
    /// The caller must re-query the current remaining amount and retry with
    /// an amount that fits.
    #[error("Payment of {requested} exceeds remaining debt {remaining} on {debt_id}")]
    PaymentExceedsRemaining {
        debt_id: String,
        remaining: i64,
        requested: i64,
    },

    /// Invoice is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling an invoice that is not Active
    /// - Returning items on a cancelled or fully returned invoice
    #[error("Invoice {invoice_id} is {status}, cannot perform operation")]
    InvalidInvoiceStatus { invoice_id: String, status: String },

    /// A return request names a product the invoice never carried.
    #[error("Invoice {invoice_id} has no line item for product {product_id}")]
    UnknownReturnItem {
        invoice_id: String,
        product_id: String,
    },

    /// A return request exceeds what is still returnable on a line item.
    #[error("Cannot return {requested} of {product_id}: only {available} remaining")]
    OverReturn {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The identical return request was already applied to this invoice.
    ///
    /// ## When This Occurs
    /// - Re-submitting the same (product, quantity) pair after it was
    ///   refunded once — rejected instead of double-refunded
    #[error("Return of {quantity} × {product_id} already processed")]
    AlreadyReturned { product_id: String, quantity: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error for the caller's retry/deny decision.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InsufficientPoints { .. } | CoreError::PaymentExceedsRemaining { .. } => {
                ErrorKind::LimitExceeded
            }
            CoreError::InvalidMilestone { .. }
            | CoreError::InvalidInvoiceStatus { .. }
            | CoreError::UnknownReturnItem { .. }
            | CoreError::OverReturn { .. }
            | CoreError::AlreadyReturned { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same product listed twice in one request).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PaymentExceedsRemaining {
            debt_id: "d-1".to_string(),
            remaining: 300_000,
            requested: 500_000,
        };
        assert_eq!(
            err.to_string(),
            "Payment of 500000 exceeds remaining debt 300000 on d-1"
        );

        let err = CoreError::OverReturn {
            product_id: "p-9".to_string(),
            requested: 5,
            available: 2,
        };
        assert_eq!(err.to_string(), "Cannot return 5 of p-9: only 2 remaining");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CoreError::InsufficientPoints {
                balance: 10,
                requested: 100
            }
            .kind(),
            ErrorKind::LimitExceeded
        );
        assert_eq!(
            CoreError::InvalidMilestone { requested: 123 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::AlreadyReturned {
                product_id: "p-1".to_string(),
                quantity: 1
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
