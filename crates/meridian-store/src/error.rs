//! # Store Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Storage failure (missing row, version mismatch)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds entity + id context                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (meridian-engine) ← Classified for retry/deny             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller renders a user-facing message or retries (Conflict only)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use meridian_core::ErrorKind;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in the store.
    ///
    /// ## When This Occurs
    /// - Unknown customer/invoice/debt id
    /// - Record was deleted (cancellation removed a debt)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Versioned update lost a race with another writer.
    ///
    /// ## When This Occurs
    /// - Two checkouts for the same customer commit concurrently
    /// - A payment and a return adjust the same debt concurrently
    ///
    /// Safely retryable: re-read the record, re-apply, re-commit.
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },

    /// Insert hit an existing primary key.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: String, id: String },

    /// Backend failure outside the engine's model (I/O, corruption).
    ///
    /// Treated as transient and retryable by the engine's bounded retry.
    #[error("Store failure: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a version mismatch.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Duplicate error for a primary-key collision.
    pub fn duplicate(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Duplicate {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Classifies this error for the caller's retry/deny decision.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } | StoreError::Duplicate { .. } | StoreError::Internal(_) => {
                ErrorKind::Conflict
            }
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::not_found("Debt", "d-1");
        assert_eq!(err.to_string(), "Debt not found: d-1");

        let err = StoreError::conflict("Customer", "c-1");
        assert_eq!(err.to_string(), "Concurrent modification of Customer c-1");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(StoreError::not_found("Debt", "d-1").kind(), ErrorKind::NotFound);
        assert_eq!(StoreError::conflict("Debt", "d-1").kind(), ErrorKind::Conflict);
        assert_eq!(StoreError::duplicate("Debt", "d-1").kind(), ErrorKind::Conflict);
    }
}
