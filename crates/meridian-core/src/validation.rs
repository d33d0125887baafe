//! # Validation Module
//!
//! Input validation utilities shared by the engine's public operations.
//!
//! ## Validation Strategy
//! Validation runs at the operation boundary, before any business logic or
//! store access: a request that cannot possibly succeed should fail without
//! consuming a read-modify-write cycle. The storage layer is still free to
//! enforce its own constraints underneath — multiple layers catch
//! different mistakes.
//!
//! ## Usage
//! ```rust
//! use meridian_core::validation::{validate_entity_id, validate_payment_amount};
//!
//! validate_entity_id("customer_id", "550e8400-e29b-41d4-a716-446655440000").unwrap();
//! validate_payment_amount(200_000).unwrap();
//! ```

use crate::error::{ValidationError, ValidationResult};

/// Longest accepted actor name on debt history entries.
pub const MAX_ACTOR_LEN: usize = 100;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity id (customer/invoice/debt).
///
/// ## Rules
/// - Must not be empty
/// - Must be a valid UUID format
pub fn validate_entity_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Whether it fits the remaining debt is business logic, checked later
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount-paid figure at checkout.
///
/// ## Rules
/// - Must be non-negative (zero is a fully-on-credit sale)
pub fn validate_amount_paid(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "amount paid".to_string(),
        });
    }

    Ok(())
}

/// Validates a line-item quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a points amount for redemption requests.
pub fn validate_points_amount(points: i64) -> ValidationResult<()> {
    if points <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates the actor recorded on a debt payment.
///
/// ## Rules
/// - Must not be empty
/// - Maximum 100 characters
pub fn validate_actor(actor: &str) -> ValidationResult<()> {
    let actor = actor.trim();

    if actor.is_empty() {
        return Err(ValidationError::Required {
            field: "actor".to_string(),
        });
    }

    if actor.len() > MAX_ACTOR_LEN {
        return Err(ValidationError::TooLong {
            field: "actor".to_string(),
            max: MAX_ACTOR_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
