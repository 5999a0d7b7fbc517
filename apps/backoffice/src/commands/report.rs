//! # Report Commands
//!
//! Financial summary over completed sales orders. Dates arrive as
//! `YYYY-MM-DD` strings and both ends are inclusive (UTC days).

use chrono::NaiveDate;
use serde::Serialize;
use stockwise_core::{FinancialSummary, Money};
use tracing::debug;

use crate::error::ApiError;
use crate::Backoffice;

/// Summary totals formatted for display, without the order list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub order_count: usize,
    pub total_sales: String,
    pub total_cost: String,
    pub gross_profit: String,
    pub gross_margin_percent: f64,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{} must be a YYYY-MM-DD date, got '{}'", field, value)))
}

/// Sales, cost and gross profit of orders shipped between the two dates.
///
/// A start date after the end date yields an empty summary.
pub async fn get_financial_summary(app: &Backoffice, start: &str, end: &str) -> Result<FinancialSummary, ApiError> {
    let start = parse_date("startDate", start)?;
    let end = parse_date("endDate", end)?;
    debug!(%start, %end, "get_financial_summary command");

    Ok(app.db().reports().financial_summary(start, end).await?)
}

/// The same totals for one customer.
pub async fn get_customer_statement(
    app: &Backoffice,
    customer_id: &str,
    start: &str,
    end: &str,
) -> Result<FinancialSummary, ApiError> {
    let start = parse_date("startDate", start)?;
    let end = parse_date("endDate", end)?;

    Ok(app
        .db()
        .reports()
        .customer_statement(customer_id, start, end)
        .await?)
}

/// Formats a summary with the configured currency.
pub fn summary_view(app: &Backoffice, start: NaiveDate, end: NaiveDate, summary: &FinancialSummary) -> SummaryView {
    let config = app.config();
    SummaryView {
        start_date: start,
        end_date: end,
        order_count: summary.order_count,
        total_sales: config.display_money(Money::from_cents(summary.total_sales_cents)),
        total_cost: config.display_money(Money::from_cents(summary.total_cost_cents)),
        gross_profit: config.display_money(Money::from_cents(summary.gross_profit_cents)),
        gross_margin_percent: summary.gross_margin_percent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::backoffice;

    #[tokio::test]
    async fn test_bad_date_is_validation_error() {
        let app = backoffice().await;
        let err = get_financial_summary(&app, "2024-13-01", "2024-12-31").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("startDate"));
    }

    #[tokio::test]
    async fn test_empty_range() {
        let app = backoffice().await;
        let summary = get_financial_summary(&app, "2024-01-01", "2024-01-31").await.unwrap();
        assert_eq!(summary.order_count, 0);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let view = summary_view(&app, start, end, &summary);
        assert_eq!(view.total_sales, "$0.00");
        assert_eq!(view.gross_margin_percent, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_customer_statement() {
        let app = backoffice().await;
        let err = get_customer_statement(&app, "missing", "2024-01-01", "2024-01-31")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
