//! # Financial Reports
//!
//! Read-only summaries over completed sales orders.
//!
//! The date range is inclusive on both ends: `[start 00:00, end 23:59:59.999]`
//! UTC. A range with `start > end` matches nothing.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use stockwise_core::ledger::{report_window, shipped_within, summarize};
use stockwise_core::{CoreError, CoreResult, FinancialSummary};
use tracing::debug;

use crate::repository::customer::CustomerRepository;
use crate::repository::sales_order::SalesOrderRepository;

#[derive(Debug, Clone)]
pub struct FinancialReports {
    pool: SqlitePool,
}

impl FinancialReports {
    pub fn new(pool: SqlitePool) -> Self {
        FinancialReports { pool }
    }

    /// Sales, cost, gross profit and margin over orders shipped in the range.
    pub async fn financial_summary(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<FinancialSummary> {
        self.summarize_range(None, start, end).await
    }

    /// The same totals restricted to one customer's orders.
    pub async fn customer_statement(
        &self,
        customer_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<FinancialSummary> {
        let customers = CustomerRepository::new(self.pool.clone());
        if customers.get_by_id(customer_id).await?.is_none() {
            return Err(CoreError::not_found("Customer", customer_id));
        }

        self.summarize_range(Some(customer_id), start, end).await
    }

    async fn summarize_range(
        &self,
        customer_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<FinancialSummary> {
        if start > end {
            return Ok(summarize(Vec::new()));
        }

        let (from, until) = report_window(start, end)?;

        let orders: Vec<_> = SalesOrderRepository::new(self.pool.clone())
            .list_completed(customer_id)
            .await?
            .into_iter()
            .filter(|order| shipped_within(order, from, until))
            .collect();

        debug!(
            start = %start,
            end = %end,
            customer_id = customer_id.unwrap_or("*"),
            orders = orders.len(),
            "Summarizing completed sales"
        );

        Ok(summarize(orders))
    }
}
