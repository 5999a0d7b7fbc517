//! # API Error Type
//!
//! Unified error type for backoffice commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockwise                              │
//! │                                                                         │
//! │  Caller                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  ship_sales_order(id)                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Ledger Error? ─── CoreError::InsufficientStock ──┐              │  │
//! │  │         │                                          │              │  │
//! │  │         ▼                                          ▼              │  │
//! │  │  Store Error? ──── DbError::QueryFailed ──────── ApiError ──────►│  │
//! │  │         │          (details logged, not returned)                │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for CHAIR-01: available 15, ..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stockwise_core::CoreError;
use stockwise_db::DbError;

/// API error returned from backoffice commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 5d1c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced record does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The change would take a product below zero
    InsufficientStock,

    /// The order's status does not permit the operation
    InvalidState,

    /// No authenticated user on the session
    Unauthorized,

    /// Lost a race with another writer; safe to retry
    Conflict,

    /// Persistence failed; nothing was committed
    StoreUnavailable,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::StoreUnavailable, message)
    }
}

/// Converts database errors to API errors.
///
/// Internal details are logged and replaced with a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::VersionConflict { entity, id } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} {} was modified concurrently, please retry", entity, id),
            ),
            DbError::Busy(e) => {
                tracing::warn!("Database busy: {}", e);
                ApiError::new(ErrorCode::Conflict, "Database is busy, please retry")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::store_unavailable("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::store_unavailable("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::store_unavailable("Database operation failed")
            }
            DbError::Decode { column, reason } => {
                tracing::error!(column = %column, "Corrupt stored value: {}", reason);
                ApiError::store_unavailable("Database operation failed")
            }
            DbError::PoolExhausted => ApiError::store_unavailable("Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::store_unavailable("Database operation failed")
            }
        }
    }
}

/// Converts ledger errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock { .. } => ApiError::new(ErrorCode::InsufficientStock, err.to_string()),
            CoreError::InvalidStateTransition { .. } => ApiError::new(ErrorCode::InvalidState, err.to_string()),
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::Unauthorized => ApiError::new(ErrorCode::Unauthorized, err.to_string()),
            CoreError::Conflict { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            CoreError::StoreUnavailable(e) => {
                tracing::error!("Store unavailable: {}", e);
                ApiError::store_unavailable("Database operation failed")
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}
