//! # Validation Module
//!
//! Input validation utilities for Stockwise.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Backoffice command                                           │
//! │  ├── Type validation (deserialization of drafts)                       │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger engine                                                │
//! │  └── Stock sufficiency and status transitions (inside the transaction) │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (current_stock >= 0)                                        │
//! │  ├── UNIQUE (sku, order_number, codes)                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockwise_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("CHAIR-01").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerDraft, ProductDraft, PurchaseOrderDraft, SalesOrderDraft, SupplierDraft};
use crate::{MAX_AMOUNT_CENTS, MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_sku;
///
/// assert!(validate_sku("CHAIR-01").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_code("sku", sku)
}

/// Validates a business code (customer code, supplier code, SKU).
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, supplier).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text note. Notes are optional, at most 500 characters.
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    match note {
        Some(text) if text.chars().count() > 500 => Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: 500,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level target (stocktake count or opening stock).
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_LINE_QUANTITY * 1000).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY * 1000,
        });
    }
    Ok(())
}

/// Validates a price or cost in cents.
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("unit_price", 1099).is_ok());
/// assert!(validate_amount_cents("unit_price", 0).is_ok());
/// assert!(validate_amount_cents("unit_price", -100).is_err());
/// assert!(validate_amount_cents("unit_price", i64::MAX / 2).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates the number of lines on an order.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use stockwise_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<()> {
    validate_sku(&draft.sku)?;
    validate_name("name", &draft.name)?;
    if draft.unit.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "unit".to_string(),
        });
    }
    validate_amount_cents("price_retail", draft.price_retail_cents)?;
    validate_amount_cents("price_bronze", draft.price_bronze_cents)?;
    validate_amount_cents("price_silver", draft.price_silver_cents)?;
    validate_amount_cents("price_gold", draft.price_gold_cents)?;
    validate_stock_level(draft.opening_stock)?;
    validate_amount_cents("opening_cost", draft.opening_cost_cents)?;
    if let Some(threshold) = draft.low_stock_threshold {
        validate_stock_level(threshold)?;
    }
    Ok(())
}

pub fn validate_customer_draft(draft: &CustomerDraft) -> ValidationResult<()> {
    validate_code("customer_code", &draft.customer_code)?;
    validate_name("name", &draft.name)?;
    validate_note(draft.notes.as_deref())
}

pub fn validate_supplier_draft(draft: &SupplierDraft) -> ValidationResult<()> {
    validate_code("supplier_code", &draft.supplier_code)?;
    validate_name("name", &draft.name)?;
    validate_note(draft.notes.as_deref())
}

pub fn validate_sales_order_draft(draft: &SalesOrderDraft) -> ValidationResult<()> {
    if draft.customer_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }
    validate_line_count(draft.items.len())?;
    for line in &draft.items {
        validate_quantity(line.quantity)?;
        if let Some(price) = line.unit_price_cents {
            validate_amount_cents("unit_price", price)?;
        }
    }
    validate_note(draft.shipping_note.as_deref())?;
    validate_note(draft.internal_note.as_deref())
}

pub fn validate_purchase_order_draft(draft: &PurchaseOrderDraft) -> ValidationResult<()> {
    if draft.supplier_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "supplier_id".to_string(),
        });
    }
    validate_line_count(draft.items.len())?;
    for line in &draft.items {
        validate_quantity(line.quantity)?;
        validate_amount_cents("unit_cost", line.unit_cost_cents)?;
    }
    validate_note(draft.note.as_deref())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PurchaseLineDraft, SalesLineDraft};

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CHAIR-01").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Office Chair").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount_cents_upper_bound() {
        assert!(validate_amount_cents("unit_price", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount_cents("unit_price", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));
    }

    #[test]
    fn test_sales_order_draft_rejects_unbounded_price() {
        let draft = SalesOrderDraft {
            customer_id: "c-1".into(),
            items: vec![SalesLineDraft {
                product_id: "p-1".into(),
                quantity: 3,
                unit_price_cents: Some(i64::MAX / 2),
            }],
            ..Default::default()
        };
        assert!(matches!(
            validate_sales_order_draft(&draft),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_sales_order_draft_needs_lines() {
        let mut draft = SalesOrderDraft {
            customer_id: "c-1".into(),
            ..Default::default()
        };
        assert!(matches!(
            validate_sales_order_draft(&draft),
            Err(ValidationError::Required { .. })
        ));

        draft.items.push(SalesLineDraft {
            product_id: "p-1".into(),
            quantity: 2,
            unit_price_cents: None,
        });
        assert!(validate_sales_order_draft(&draft).is_ok());

        draft.items[0].unit_price_cents = Some(-1);
        assert!(validate_sales_order_draft(&draft).is_err());
    }

    #[test]
    fn test_purchase_order_draft_rejects_zero_quantity() {
        let draft = PurchaseOrderDraft {
            supplier_id: "s-1".into(),
            items: vec![PurchaseLineDraft {
                product_id: "p-1".into(),
                quantity: 0,
                unit_cost_cents: 100,
            }],
            note: None,
        };
        assert!(matches!(
            validate_purchase_order_draft(&draft),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_product_draft() {
        let draft = ProductDraft {
            sku: "CHAIR-01".into(),
            name: "Office Chair".into(),
            unit: "pcs".into(),
            price_retail_cents: 20_000,
            ..Default::default()
        };
        assert!(validate_product_draft(&draft).is_ok());

        let negative = ProductDraft {
            opening_stock: -1,
            ..draft
        };
        assert!(validate_product_draft(&negative).is_err());
    }
}
