//! # Domain Types
//!
//! Core domain types used throughout Stockwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SalesOrder    │   │ PurchaseOrder   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  order_number   │   │  order_number   │       │
//! │  │  sku (business) │   │  customer_info  │   │  supplier_info  │       │
//! │  │  current_stock  │   │  items[]        │   │  items[]        │       │
//! │  │  average_cost   │   │  status         │   │  status         │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ every stock change                                         │
//! │           ▼                                                             │
//! │  ┌──────────────────────────┐   ┌─────────────────┐                    │
//! │  │ InventoryHistoryEntry    │   │    Customer     │  Supplier          │
//! │  │  change, stock_after     │   │  level (tier)   │                    │
//! │  │  cost_before/after       │   └─────────────────┘                    │
//! │  └──────────────────────────┘                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, order_number, customer_code) - human-readable
//!
//! ## Snapshot Pattern
//! Orders copy the customer/supplier details and each product's sku, name
//! and spec at creation time. Later edits to the master records never
//! rewrite an existing order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Price Tier
// =============================================================================

/// Customer price level. Each product carries one price per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    #[default]
    Retail,
    Bronze,
    Silver,
    Gold,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Retail => "retail",
            PriceTier::Bronze => "bronze",
            PriceTier::Silver => "silver",
            PriceTier::Gold => "gold",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Address
// =============================================================================

/// Postal address shared by customers, suppliers and shipping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub zip_code: String,
    pub city: String,
    pub district: String,
    pub street: String,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `current_stock` and `average_cost_cents` are derived fields. They change
/// only through the stock ledger, never through a product edit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, immutable after creation.
    pub sku: String,

    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Size/variant text printed on orders ("450ml", "A4 80gsm").
    pub spec: Option<String>,
    /// Selling unit ("pcs", "box").
    pub unit: String,
    pub description: Option<String>,
    pub barcode: Option<String>,

    pub price_retail_cents: i64,
    pub price_bronze_cents: i64,
    pub price_silver_cents: i64,
    pub price_gold_cents: i64,

    /// On-hand quantity. Never negative.
    pub current_stock: i64,

    /// Weighted average unit cost in cents. Recalculated on receiving only.
    pub average_cost_cents: i64,

    /// Products at or below this level show up in the low-stock listing.
    pub low_stock_threshold: Option<i64>,

    /// Preferred supplier.
    pub supplier_id: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency token, bumped on every write.
    pub version: i64,
}

impl Product {
    #[inline]
    pub fn average_cost(&self) -> Money {
        Money::from_cents(self.average_cost_cents)
    }

    /// Returns the selling price for a tier, falling back to retail when the
    /// tier has no price set.
    pub fn price_for(&self, tier: PriceTier) -> Money {
        let cents = match tier {
            PriceTier::Retail => self.price_retail_cents,
            PriceTier::Bronze => self.price_bronze_cents,
            PriceTier::Silver => self.price_silver_cents,
            PriceTier::Gold => self.price_gold_cents,
        };

        if cents > 0 {
            Money::from_cents(cents)
        } else {
            Money::from_cents(self.price_retail_cents)
        }
    }

    /// Checks whether `quantity` units can leave stock.
    pub fn can_ship(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    pub fn is_low_stock(&self) -> bool {
        matches!(self.low_stock_threshold, Some(threshold) if self.current_stock <= threshold)
    }
}

/// Caller-supplied product fields for create or update.
///
/// `opening_stock`/`opening_cost_cents` apply only when the product is
/// created; they are booked as an adjustment entry so the ledger explains
/// the starting quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub spec: Option<String>,
    pub unit: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub price_retail_cents: i64,
    pub price_bronze_cents: i64,
    pub price_silver_cents: i64,
    pub price_gold_cents: i64,
    pub low_stock_threshold: Option<i64>,
    pub supplier_id: Option<String>,
    pub is_active: bool,
    pub opening_stock: i64,
    pub opening_cost_cents: i64,
}

// =============================================================================
// Customer & Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub customer_code: String,
    pub name: String,
    pub level: PriceTier,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Freezes the fields a sales order keeps about its customer.
    pub fn snapshot(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            name: self.name.clone(),
            level: self.level,
            tax_id: self.tax_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub id: Option<String>,
    pub customer_code: String,
    pub name: String,
    pub level: PriceTier,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub supplier_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    pub fn snapshot(&self) -> SupplierSnapshot {
        SupplierSnapshot {
            name: self.name.clone(),
            tax_id: self.tax_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDraft {
    pub id: Option<String>,
    pub supplier_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
}

/// Customer details frozen onto a sales order at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSnapshot {
    pub name: String,
    pub level: PriceTier,
    pub tax_id: Option<String>,
}

/// Supplier details frozen onto a purchase order at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierSnapshot {
    pub name: String,
    pub tax_id: Option<String>,
}

/// Result of a delete request on a master record.
///
/// Records still referenced by the ledger or by orders are deactivated
/// instead of removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteOutcome {
    Deleted,
    Deactivated,
}

// =============================================================================
// Inventory History
// =============================================================================

/// Why a stock level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryType {
    PurchaseIn,
    SalesOut,
    Adjustment,
    CustomerReturn,
    SupplierReturn,
}

impl HistoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryType::PurchaseIn => "purchase-in",
            HistoryType::SalesOut => "sales-out",
            HistoryType::Adjustment => "adjustment",
            HistoryType::CustomerReturn => "customer-return",
            HistoryType::SupplierReturn => "supplier-return",
        }
    }

    /// Only receiving stock from a supplier moves the average cost.
    pub fn updates_average_cost(&self) -> bool {
        matches!(self, HistoryType::PurchaseIn)
    }
}

impl fmt::Display for HistoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable ledger line. Written once per stock-affecting step.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryHistoryEntry {
    /// Insertion sequence; total order of the ledger.
    pub seq: i64,
    pub id: String,
    pub product_id: String,
    /// SKU at time of the movement (frozen).
    pub sku: String,
    /// Product name at time of the movement (frozen).
    pub product_name: String,
    #[serde(rename = "type")]
    pub movement_type: HistoryType,
    /// Signed quantity delta.
    pub change: i64,
    /// Stock level right after this movement.
    pub stock_after: i64,
    pub cost_before_cents: Option<i64>,
    pub cost_after_cents: Option<i64>,
    /// Order that caused the movement, when there is one.
    pub related_doc_id: Option<String>,
    pub note: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales Order
// =============================================================================

/// Lifecycle of a sales order.
///
/// ```text
/// pending-approval ──approve──► pending-shipment ──ship──► completed
///        │                              │
///        └────────────cancel────────────┴──► cancelled
/// ```
///
/// `PartiallyShipped` is reserved; no operation produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum SalesOrderStatus {
    #[default]
    PendingApproval,
    PendingShipment,
    Completed,
    Cancelled,
    PartiallyShipped,
}

/// Operations that move a sales order between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesOrderAction {
    Approve,
    Ship,
    Cancel,
}

impl SalesOrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderAction::Approve => "approve",
            SalesOrderAction::Ship => "ship",
            SalesOrderAction::Cancel => "cancel",
        }
    }
}

impl SalesOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::PendingApproval => "pending-approval",
            SalesOrderStatus::PendingShipment => "pending-shipment",
            SalesOrderStatus::Completed => "completed",
            SalesOrderStatus::Cancelled => "cancelled",
            SalesOrderStatus::PartiallyShipped => "partially-shipped",
        }
    }

    /// Transition table. `None` means the action is not allowed from here.
    pub fn next(self, action: SalesOrderAction) -> Option<SalesOrderStatus> {
        use SalesOrderAction::*;
        use SalesOrderStatus::*;

        match (self, action) {
            (PendingApproval, Approve) => Some(PendingShipment),
            (PendingShipment, Ship) => Some(Completed),
            (PendingApproval, Cancel) | (PendingShipment, Cancel) => Some(Cancelled),
            (PendingApproval, Ship)
            | (PendingShipment, Approve)
            | (Completed, _)
            | (Cancelled, _)
            | (PartiallyShipped, _) => None,
        }
    }
}

impl fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// A line on a sales order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesOrderItem {
    pub product_id: String,
    /// SKU at time of ordering (frozen).
    pub sku: String,
    /// Product name at time of ordering (frozen).
    pub name: String,
    pub spec: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub subtotal_cents: i64,
    /// Average cost captured at shipment. `None` until the order ships.
    pub unit_cost_cents: Option<i64>,
}

impl SalesOrderItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOrder {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub customer_info: CustomerSnapshot,
    pub shipping_address: Option<Address>,
    pub items: Vec<SalesOrderItem>,
    pub total_amount_cents: i64,
    /// Set at shipment, `None` before.
    pub total_cost_cents: Option<i64>,
    /// Set at shipment, `None` before.
    pub gross_profit_cents: Option<i64>,
    pub status: SalesOrderStatus,
    pub payment_status: PaymentStatus,
    pub invoice_number: Option<String>,
    pub shipping_note: Option<String>,
    pub internal_note: Option<String>,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub shipped_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl SalesOrder {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Checks the costing invariant: completed orders are fully costed and
    /// every other order carries no cost data.
    pub fn costing_is_consistent(&self) -> bool {
        let header_costed = self.total_cost_cents.is_some() && self.gross_profit_cents.is_some();
        let header_clear = self.total_cost_cents.is_none() && self.gross_profit_cents.is_none();
        let items_costed = self.items.iter().all(|i| i.unit_cost_cents.is_some());
        let items_clear = self.items.iter().all(|i| i.unit_cost_cents.is_none());

        if self.status == SalesOrderStatus::Completed {
            header_costed && items_costed
        } else {
            header_clear && items_clear
        }
    }
}

/// A requested sales order line. `unit_price_cents` defaults to the
/// customer's tier price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesLineDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderDraft {
    pub customer_id: String,
    pub items: Vec<SalesLineDraft>,
    pub shipping_address: Option<Address>,
    pub invoice_number: Option<String>,
    pub shipping_note: Option<String>,
    pub internal_note: Option<String>,
}

// =============================================================================
// Purchase Order
// =============================================================================

/// Lifecycle of a purchase order.
///
/// ```text
/// pending-receipt ──receive──► completed
///        └──────────cancel───► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseOrderStatus {
    #[default]
    PendingReceipt,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOrderAction {
    Receive,
    Cancel,
}

impl PurchaseOrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderAction::Receive => "receive",
            PurchaseOrderAction::Cancel => "cancel",
        }
    }
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::PendingReceipt => "pending-receipt",
            PurchaseOrderStatus::Completed => "completed",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn next(self, action: PurchaseOrderAction) -> Option<PurchaseOrderStatus> {
        match (self, action) {
            (PurchaseOrderStatus::PendingReceipt, PurchaseOrderAction::Receive) => {
                Some(PurchaseOrderStatus::Completed)
            }
            (PurchaseOrderStatus::PendingReceipt, PurchaseOrderAction::Cancel) => {
                Some(PurchaseOrderStatus::Cancelled)
            }
            (PurchaseOrderStatus::Completed, _) | (PurchaseOrderStatus::Cancelled, _) => None,
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrderItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub spec: Option<String>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub subtotal_cents: i64,
}

impl PurchaseOrderItem {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub order_number: String,
    pub supplier_id: String,
    pub supplier_info: SupplierSnapshot,
    pub items: Vec<PurchaseOrderItem>,
    pub total_amount_cents: i64,
    pub status: PurchaseOrderStatus,
    pub note: Option<String>,
    pub created_by: String,
    pub received_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub received_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDraft {
    pub supplier_id: String,
    pub items: Vec<PurchaseLineDraft>,
    pub note: Option<String>,
}

// =============================================================================
// Stocktake
// =============================================================================

/// One requested stocktake line: set `product_id` to exactly `new_stock`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDraft {
    pub product_id: String,
    pub new_stock: i64,
    pub note: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// Totals over completed sales orders in a date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub total_sales_cents: i64,
    pub total_cost_cents: i64,
    pub gross_profit_cents: i64,
    /// Gross margin in basis points (3543 = 35.43%). Zero without sales.
    pub gross_margin_bps: i64,
    pub order_count: usize,
    pub orders: Vec<SalesOrder>,
}

impl FinancialSummary {
    /// Gross margin as a percentage, for display.
    pub fn gross_margin_percent(&self) -> f64 {
        self.gross_margin_bps as f64 / 100.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, threshold: Option<i64>) -> Product {
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
            price_bronze_cents: 19_000,
            price_silver_cents: 0,
            price_gold_cents: 17_500,
            current_stock: stock,
            average_cost_cents: 14_333,
            low_stock_threshold: threshold,
            supplier_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn test_tier_price_falls_back_to_retail() {
        let p = product(10, None);
        assert_eq!(p.price_for(PriceTier::Gold).cents(), 17_500);
        assert_eq!(p.price_for(PriceTier::Silver).cents(), 20_000);
        assert_eq!(p.price_for(PriceTier::Retail).cents(), 20_000);
    }

    #[test]
    fn test_low_stock() {
        assert!(product(3, Some(5)).is_low_stock());
        assert!(product(5, Some(5)).is_low_stock());
        assert!(!product(6, Some(5)).is_low_stock());
        assert!(!product(0, None).is_low_stock());
    }

    #[test]
    fn test_sales_order_transitions() {
        use SalesOrderAction::*;
        use SalesOrderStatus::*;

        assert_eq!(PendingApproval.next(Approve), Some(PendingShipment));
        assert_eq!(PendingShipment.next(Ship), Some(Completed));
        assert_eq!(PendingApproval.next(Cancel), Some(Cancelled));
        assert_eq!(PendingShipment.next(Cancel), Some(Cancelled));

        assert_eq!(PendingApproval.next(Ship), None);
        assert_eq!(Completed.next(Cancel), None);
        assert_eq!(Cancelled.next(Approve), None);
        assert_eq!(PartiallyShipped.next(Ship), None);
    }

    #[test]
    fn test_purchase_order_transitions() {
        use PurchaseOrderAction::*;
        use PurchaseOrderStatus::*;

        assert_eq!(PendingReceipt.next(Receive), Some(Completed));
        assert_eq!(PendingReceipt.next(Cancel), Some(Cancelled));
        assert_eq!(Completed.next(Receive), None);
        assert_eq!(Cancelled.next(Receive), None);
    }

    #[test]
    fn test_status_strings_match_serde() {
        let json = serde_json::to_string(&SalesOrderStatus::PendingShipment).unwrap();
        assert_eq!(json, format!("\"{}\"", SalesOrderStatus::PendingShipment.as_str()));

        let json = serde_json::to_string(&HistoryType::CustomerReturn).unwrap();
        assert_eq!(json, "\"customer-return\"");

        let json = serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"partially-paid\"");
    }

    #[test]
    fn test_only_receiving_moves_average_cost() {
        assert!(HistoryType::PurchaseIn.updates_average_cost());
        assert!(!HistoryType::SalesOut.updates_average_cost());
        assert!(!HistoryType::Adjustment.updates_average_cost());
    }
}
