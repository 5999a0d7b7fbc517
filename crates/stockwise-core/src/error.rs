//! # Error Types
//!
//! Domain-specific error types for stockwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockwise-core errors (this file)                                     │
//! │  ├── CoreError        - Ledger and fulfillment failures                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockwise-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, folded into CoreError        │
//! │                                                                         │
//! │  Backoffice errors (in app)                                            │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every ledger-affecting operation either commits completely or returns one
//! of these errors with nothing written.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger and fulfillment errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stock change would drive a product below zero.
    ///
    /// ## When This Occurs
    /// - Shipping a sales order whose line exceeds current stock
    /// - Adjusting stock to a negative target
    ///
    /// ## User Workflow
    /// ```text
    /// Ship SO-20240115-7KQ2 (CHAIR-01 × 20)
    ///      │
    ///      ▼
    /// Check stock: available=15
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "CHAIR-01", available: 15, requested: 20 }
    ///      │
    ///      ▼
    /// Order stays pending-shipment, no stock touched
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// The entity's current status does not permit the operation.
    ///
    /// ## When This Occurs
    /// - Receiving a purchase order that is already completed
    /// - Shipping a sales order that was never approved
    /// - Cancelling a completed sales order
    #[error("{entity} {id} is {status}, cannot {action}")]
    InvalidStateTransition {
        entity: String,
        id: String,
        status: String,
        action: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// No authenticated actor was supplied.
    #[error("An authenticated user is required")]
    Unauthorized,

    /// A concurrent writer changed the record first; the caller may retry.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: String, id: String },

    /// The persistence round trip failed; the operation was not committed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a given entity type and ID.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidStateTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        status: impl std::fmt::Display,
        action: impl Into<String>,
    ) -> Self {
        CoreError::InvalidStateTransition {
            entity: entity.into(),
            id: id.into(),
            status: status.to_string(),
            action: action.into(),
        }
    }

    /// Returns true when retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Conflict { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "CHAIR-01".to_string(),
            available: 15,
            requested: 20,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for CHAIR-01: available 15, requested 20"
        );

        let err = CoreError::invalid_transition("PurchaseOrder", "po-1", "completed", "receive");
        assert_eq!(err.to_string(), "PurchaseOrder po-1 is completed, cannot receive");
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(CoreError::conflict("Product", "p-1").is_retryable());
        assert!(!CoreError::Unauthorized.is_retryable());
        assert!(!CoreError::StoreUnavailable("disk".into()).is_retryable());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: sku is required");
    }
}
