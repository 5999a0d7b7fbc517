//! # Ledger Rules
//!
//! Pure planning for every stock-affecting step. The database layer reads a
//! product inside its transaction, asks this module what the new state is,
//! and writes exactly what comes back.
//!
//! ## One Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product (read inside tx)         plan_movement(product, delta, type)  │
//! │  ┌──────────────────────┐                    │                          │
//! │  │ stock 15             │                    ▼                          │
//! │  │ avg   143.33         │ ──────►  StockMovement                        │
//! │  └──────────────────────┘          ├── stock_before 15                  │
//! │                                    ├── stock_after  10   (≥ 0 or error) │
//! │  delta -5, sales-out               ├── cost_before  143.33              │
//! │                                    └── cost_after   143.33 (unchanged)  │
//! │                                                                         │
//! │  The writer then persists:                                              │
//! │    UPDATE products SET current_stock = 10 ... WHERE version = ?        │
//! │    INSERT INTO inventory_history (change -5, stock_after 10, ...)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{div_round_half_up, Money};
use crate::types::{FinancialSummary, HistoryType, Product, SalesOrder, SalesOrderStatus};

// =============================================================================
// Stock Movements
// =============================================================================

/// The computed effect of one stock change on one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: String,
    pub sku: String,
    pub product_name: String,
    pub movement_type: HistoryType,
    pub change: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub cost_before: Money,
    pub cost_after: Money,
    /// Version the product row must still have when the movement is written.
    pub expected_version: i64,
}

/// Fails unless `delta` moves stock the way `movement_type` says it does.
///
/// `purchase-in` and `customer-return` add stock, `sales-out` and
/// `supplier-return` remove it. An adjustment may go either way, or nowhere.
pub fn ensure_direction(delta: i64, movement_type: HistoryType) -> CoreResult<()> {
    let inbound = match movement_type {
        HistoryType::PurchaseIn | HistoryType::CustomerReturn => true,
        HistoryType::SalesOut | HistoryType::SupplierReturn => false,
        HistoryType::Adjustment => return Ok(()),
    };

    if (inbound && delta > 0) || (!inbound && delta < 0) {
        return Ok(());
    }

    Err(ValidationError::InvalidFormat {
        field: "change".to_string(),
        reason: format!(
            "{} needs a {} change, got {}",
            movement_type,
            if inbound { "positive" } else { "negative" },
            delta
        ),
    }
    .into())
}

/// Plans a signed stock change against the product's current state.
///
/// ## Rules
/// - the sign of `delta` must match the movement type (see [`ensure_direction`])
/// - `stock + delta` must stay `>= 0`, otherwise `InsufficientStock`
/// - `purchase-in` recalculates the weighted average cost using `unit_cost`
/// - every other type leaves the average cost untouched
pub fn plan_movement(
    product: &Product,
    delta: i64,
    movement_type: HistoryType,
    unit_cost: Option<Money>,
) -> CoreResult<StockMovement> {
    ensure_direction(delta, movement_type)?;

    let stock_before = product.current_stock;
    let stock_after = stock_before
        .checked_add(delta)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "change".to_string(),
            reason: "stock level overflow".to_string(),
        })?;

    if stock_after < 0 {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: stock_before,
            requested: -delta,
        });
    }

    let cost_before = product.average_cost();
    let cost_after = if movement_type.updates_average_cost() {
        let unit_cost = unit_cost.ok_or_else(|| ValidationError::Required {
            field: "unit_cost".to_string(),
        })?;
        Money::weighted_average(stock_before, cost_before, delta, unit_cost)
    } else {
        cost_before
    };

    Ok(StockMovement {
        product_id: product.id.clone(),
        sku: product.sku.clone(),
        product_name: product.name.clone(),
        movement_type,
        change: delta,
        stock_before,
        stock_after,
        cost_before,
        cost_after,
        expected_version: product.version,
    })
}

/// Plans a stocktake: the product ends at exactly `target` units.
pub fn plan_adjustment(product: &Product, target: i64) -> CoreResult<StockMovement> {
    if target < 0 {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: product.current_stock,
            requested: product.current_stock - target,
        });
    }

    plan_movement(product, target - product.current_stock, HistoryType::Adjustment, None)
}

/// Sums requested quantities per product, keeping first-seen order.
///
/// An order listing the same product on two lines must be checked against
/// the combined quantity.
pub fn aggregate_quantities<'a, I>(lines: I) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals: Vec<(String, i64)> = Vec::new();
    for (product_id, quantity) in lines {
        match totals.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, total)) => *total += quantity,
            None => totals.push((product_id.to_string(), quantity)),
        }
    }
    totals
}

/// Fails with `InsufficientStock` when `requested` exceeds on-hand stock.
pub fn ensure_available(product: &Product, requested: i64) -> CoreResult<()> {
    if product.can_ship(requested) {
        Ok(())
    } else {
        Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: product.current_stock,
            requested,
        })
    }
}

/// Cost and profit of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipmentCosting {
    pub total_cost: Money,
    pub gross_profit: Money,
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    }
    .into()
}

/// `unit × quantity`, failing with `OutOfRange` instead of overflowing.
pub fn line_subtotal(unit: Money, quantity: i64) -> CoreResult<Money> {
    unit.checked_multiply_quantity(quantity)
        .ok_or_else(|| amount_overflow("subtotal"))
}

/// Sums line amounts, failing with `OutOfRange` instead of overflowing.
pub fn sum_amounts<I>(field: &str, amounts: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts.into_iter().try_fold(Money::zero(), |acc, amount| {
        acc.checked_add(amount).ok_or_else(|| amount_overflow(field))
    })
}

/// `total_cost = Σ quantity × unit_cost`, `gross_profit = total_amount - total_cost`.
pub fn cost_shipment<I>(total_amount: Money, lines: I) -> CoreResult<ShipmentCosting>
where
    I: IntoIterator<Item = (i64, Money)>,
{
    let line_costs = lines
        .into_iter()
        .map(|(quantity, unit_cost)| line_subtotal(unit_cost, quantity))
        .collect::<CoreResult<Vec<_>>>()?;
    let total_cost = sum_amounts("total_cost", line_costs)?;
    let gross_profit = total_amount
        .checked_sub(total_cost)
        .ok_or_else(|| amount_overflow("gross_profit"))?;

    Ok(ShipmentCosting {
        total_cost,
        gross_profit,
    })
}

// =============================================================================
// Order Numbers
// =============================================================================

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds `PREFIX-YYYYMMDD-XXXX` with a four character base-36 suffix taken
/// from `entropy`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockwise_core::ledger::format_order_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(format_order_number("SO", date, 0), "SO-20240115-0000");
/// assert_eq!(format_order_number("SO", date, 35), "SO-20240115-000Z");
/// ```
pub fn format_order_number(prefix: &str, date: NaiveDate, entropy: u32) -> String {
    let mut value = entropy % 36u32.pow(4);
    let mut suffix = [b'0'; 4];
    for slot in suffix.iter_mut().rev() {
        *slot = BASE36[(value % 36) as usize];
        value /= 36;
    }

    format!(
        "{}-{}-{}",
        prefix,
        date.format("%Y%m%d"),
        String::from_utf8_lossy(&suffix)
    )
}

// =============================================================================
// Financial Summary
// =============================================================================

/// Inclusive report window `[start 00:00, end 23:59:59.999...]` in UTC,
/// returned as a half-open range `[from, until)`.
pub fn report_window(start: NaiveDate, end: NaiveDate) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next_day = end.succ_opt().ok_or_else(|| ValidationError::InvalidFormat {
        field: "end_date".to_string(),
        reason: "date is out of range".to_string(),
    })?;

    let from = start.and_time(NaiveTime::MIN).and_utc();
    let until = next_day.and_time(NaiveTime::MIN).and_utc();
    Ok((from, until))
}

/// Whether a completed order shipped inside the window.
pub fn shipped_within(order: &SalesOrder, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    order.status == SalesOrderStatus::Completed
        && matches!(order.shipped_at, Some(at) if at >= from && at < until)
}

/// Totals completed orders. Orders without cost data count as zero cost.
pub fn summarize(orders: Vec<SalesOrder>) -> FinancialSummary {
    let total_sales: i64 = orders.iter().map(|o| o.total_amount_cents).sum();
    let total_cost: i64 = orders.iter().map(|o| o.total_cost_cents.unwrap_or(0)).sum();
    let gross_profit = total_sales - total_cost;

    let gross_margin_bps = if total_sales > 0 {
        div_round_half_up(gross_profit as i128 * 10_000, total_sales as i128) as i64
    } else {
        0
    };

    FinancialSummary {
        total_sales_cents: total_sales,
        total_cost_cents: total_cost,
        gross_profit_cents: gross_profit,
        gross_margin_bps,
        order_count: orders.len(),
        orders,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomerSnapshot, PaymentStatus, PriceTier};
    use chrono::TimeZone;

    fn product(stock: i64, avg_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".into(),
            sku: "CHAIR-01".into(),
            name: "Office Chair".into(),
            brand: None,
            category: None,
            spec: None,
            unit: "pcs".into(),
            description: None,
            barcode: None,
            price_retail_cents: 20_000,
            price_bronze_cents: 0,
            price_silver_cents: 0,
            price_gold_cents: 0,
            current_stock: stock,
            average_cost_cents: avg_cents,
            low_stock_threshold: None,
            supplier_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 7,
        }
    }

    fn completed_order(total: i64, cost: Option<i64>, shipped_at: DateTime<Utc>) -> SalesOrder {
        SalesOrder {
            id: "so-1".into(),
            order_number: "SO-20240115-0001".into(),
            customer_id: "c-1".into(),
            customer_info: CustomerSnapshot {
                name: "Acme".into(),
                level: PriceTier::Retail,
                tax_id: None,
            },
            shipping_address: None,
            items: vec![],
            total_amount_cents: total,
            total_cost_cents: cost,
            gross_profit_cents: cost.map(|c| total - c),
            status: SalesOrderStatus::Completed,
            payment_status: PaymentStatus::Unpaid,
            invoice_number: None,
            shipping_note: None,
            internal_note: None,
            created_by: "u-1".into(),
            approved_by: None,
            shipped_by: None,
            created_at: shipped_at,
            updated_at: shipped_at,
            approved_at: None,
            shipped_at: Some(shipped_at),
            cancelled_at: None,
            version: 0,
        }
    }

    #[test]
    fn test_receiving_recalculates_average() {
        let p = product(10, 10_000);
        let m = plan_movement(&p, 5, HistoryType::PurchaseIn, Some(Money::from_cents(13_000))).unwrap();

        assert_eq!(m.stock_after, 15);
        assert_eq!(m.cost_before.cents(), 10_000);
        assert_eq!(m.cost_after.cents(), 11_000);
        assert_eq!(m.expected_version, 7);
    }

    #[test]
    fn test_sale_keeps_average() {
        let p = product(15, 14_333);
        let m = plan_movement(&p, -5, HistoryType::SalesOut, None).unwrap();

        assert_eq!(m.stock_after, 10);
        assert_eq!(m.cost_after.cents(), 14_333);
    }

    #[test]
    fn test_negative_stock_is_rejected() {
        let p = product(15, 14_333);
        let err = plan_movement(&p, -20, HistoryType::SalesOut, None).unwrap_err();

        match err {
            CoreError::InsufficientStock { sku, available, requested } => {
                assert_eq!(sku, "CHAIR-01");
                assert_eq!(available, 15);
                assert_eq!(requested, 20);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_receiving_requires_unit_cost() {
        let p = product(0, 0);
        let err = plan_movement(&p, 5, HistoryType::PurchaseIn, None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
    }

    #[test]
    fn test_adjustment_to_target() {
        let p = product(15, 14_333);

        let down = plan_adjustment(&p, 12).unwrap();
        assert_eq!(down.change, -3);
        assert_eq!(down.stock_after, 12);

        let same = plan_adjustment(&p, 15).unwrap();
        assert_eq!(same.change, 0);

        assert!(matches!(plan_adjustment(&p, -1), Err(CoreError::InsufficientStock { .. })));
    }

    #[test]
    fn test_aggregate_quantities() {
        let lines = vec![("a", 2), ("b", 1), ("a", 3)];
        let totals = aggregate_quantities(lines);
        assert_eq!(totals, vec![("a".to_string(), 5), ("b".to_string(), 1)]);
    }

    #[test]
    fn test_cost_shipment() {
        // 5 × 143.33 = 716.65 ; 1000.00 - 716.65 = 283.35
        let costing = cost_shipment(Money::from_cents(100_000), vec![(5, Money::from_cents(14_333))]).unwrap();
        assert_eq!(costing.total_cost.cents(), 71_665);
        assert_eq!(costing.gross_profit.cents(), 28_335);
    }

    #[test]
    fn test_totals_overflow_is_validation_error() {
        let err = line_subtotal(Money::from_cents(i64::MAX / 2), 3).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = sum_amounts("total_amount", vec![Money::from_cents(i64::MAX), Money::from_cents(1)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = cost_shipment(Money::zero(), vec![(2, Money::from_cents(i64::MAX / 2 + 1))]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert_eq!(line_subtotal(Money::from_cents(25_000), 4).unwrap().cents(), 100_000);
    }

    #[test]
    fn test_direction_must_match_movement_type() {
        let p = product(10, 10_000);

        let err = plan_movement(&p, -5, HistoryType::PurchaseIn, Some(Money::zero())).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidFormat { .. })));

        assert!(plan_movement(&p, 5, HistoryType::SupplierReturn, None).is_err());
        assert!(plan_movement(&p, -2, HistoryType::CustomerReturn, None).is_err());
        assert!(plan_movement(&p, 3, HistoryType::SalesOut, None).is_err());
        assert!(plan_movement(&p, 0, HistoryType::PurchaseIn, Some(Money::zero())).is_err());

        assert!(plan_movement(&p, 0, HistoryType::Adjustment, None).is_ok());
        assert!(plan_movement(&p, -4, HistoryType::Adjustment, None).is_ok());
        assert_eq!(plan_movement(&p, -5, HistoryType::SupplierReturn, None).unwrap().cost_after.cents(), 10_000);
        assert_eq!(plan_movement(&p, 2, HistoryType::CustomerReturn, None).unwrap().stock_after, 12);
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_order_number("PO", date, 36), "PO-20240309-0010");
        assert_eq!(format_order_number("SO", date, 36u32.pow(4) - 1), "SO-20240309-ZZZZ");
        // wraps instead of growing past four characters
        assert_eq!(format_order_number("SO", date, 36u32.pow(4)), "SO-20240309-0000");
    }

    #[test]
    fn test_report_window_includes_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let (from, until) = report_window(start, end).unwrap();

        let late = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        assert!(shipped_within(&completed_order(100, Some(50), late), from, until));
        assert!(!shipped_within(&completed_order(100, Some(50), next), from, until));
        assert!(shipped_within(&completed_order(100, Some(50), from), from, until));
    }

    #[test]
    fn test_summarize() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let summary = summarize(vec![
            completed_order(100_000, Some(71_665), at),
            completed_order(50_000, None, at),
        ]);

        assert_eq!(summary.total_sales_cents, 150_000);
        assert_eq!(summary.total_cost_cents, 71_665);
        assert_eq!(summary.gross_profit_cents, 78_335);
        // 78335 / 150000 = 52.2233% → 5222 bps
        assert_eq!(summary.gross_margin_bps, 5222);
        assert_eq!(summary.order_count, 2);
    }

    #[test]
    fn test_summarize_without_sales() {
        let summary = summarize(vec![]);
        assert_eq!(summary.gross_margin_bps, 0);
        assert_eq!(summary.gross_margin_percent(), 0.0);
    }
}
