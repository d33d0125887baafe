//! # Engine Error Types
//!
//! What the checkout/returns caller sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError / StoreError (lower crates)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (this module) ← Adds orchestration-level failures         │
//! │       │                                                                 │
//! │       ├── kind() == Conflict → engine retries (bounded), caller may    │
//! │       │                        retry again after re-reading state      │
//! │       │                                                                 │
//! │       └── everything else → caller renders a localized denial          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use meridian_core::{CoreError, DenialReason, ErrorKind, ValidationError};
use meridian_store::StoreError;
use thiserror::Error;

/// Orchestration-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure (not found, version conflict).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The tier discount did not survive re-evaluation at commit time.
    ///
    /// ## When This Occurs
    /// - Another checkout consumed the last usage slot between the advisory
    ///   evaluation and finalization
    /// - The caller requested a tier discount the customer never qualified
    ///   for
    #[error("Tier discount denied: {message}")]
    DiscountDenied {
        denial: Option<DenialReason>,
        message: String,
    },

    /// A redemption is already pending for this customer.
    ///
    /// One pending redemption per customer: the second request is refused
    /// until the first is finalized or cancelled.
    #[error("A redemption is already pending for customer {customer_id}")]
    RedemptionPending { customer_id: String },

    /// Finalization referenced a redemption that was never quoted.
    #[error("No pending redemption for customer {customer_id}")]
    NoPendingRedemption { customer_id: String },

    /// Finalization's point amount disagrees with the pending quote.
    #[error("Pending redemption for {customer_id} is {pending} points, draft says {requested}")]
    RedemptionMismatch {
        customer_id: String,
        pending: i64,
        requested: i64,
    },
}

impl EngineError {
    /// Classifies this error for the caller's retry/deny decision.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(e) => e.kind(),
            EngineError::Store(e) => e.kind(),
            EngineError::DiscountDenied { denial, .. } => match denial {
                Some(DenialReason::UsageLimitReached) => ErrorKind::LimitExceeded,
                _ => ErrorKind::Validation,
            },
            EngineError::RedemptionPending { .. } => ErrorKind::Conflict,
            EngineError::NoPendingRedemption { .. } | EngineError::RedemptionMismatch { .. } => {
                ErrorKind::Validation
            }
        }
    }

    /// Whether the engine's bounded retry loop should re-run the cycle.
    ///
    /// Only storage-level conflicts qualify: re-reading fixes a lost
    /// version race, but retrying a pending-redemption refusal or an
    /// exhausted usage window would just spin.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Store(StoreError::Conflict { .. })
                | EngineError::Store(StoreError::Internal(_))
        )
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = EngineError::DiscountDenied {
            denial: Some(DenialReason::UsageLimitReached),
            message: "usage limit reached".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
        assert!(!err.is_retryable());

        let err = EngineError::DiscountDenied {
            denial: Some(DenialReason::OrderBelowMinimum),
            message: "order below minimum".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: EngineError = StoreError::conflict("Customer", "c-1").into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_retryable());

        let err: EngineError = StoreError::not_found("Debt", "d-1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_redemption_pending_is_conflict_but_not_auto_retried() {
        let err = EngineError::RedemptionPending {
            customer_id: "c-1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());
    }
}
