//! # Stock Adjustments
//!
//! Stocktake corrections: "this product now has exactly N units".
//!
//! A batch is best-effort. Each line runs in its own transaction and gets its
//! own outcome, so one bad line does not undo the others.

use chrono::Utc;
use sqlx::SqlitePool;
use stockwise_core::ledger::plan_adjustment;
use stockwise_core::validation::{validate_note, validate_stock_level};
use stockwise_core::{ActorId, AdjustmentDraft, CoreResult, InventoryHistoryEntry, Session};
use tracing::{info, warn};

use super::{begin, commit, retry_on_conflict, RetryPolicy};
use crate::repository::{history, product};

/// Note used when the caller gives none.
pub const DEFAULT_ADJUSTMENT_NOTE: &str = "Stocktake adjustment";

/// Result of one line of a batch adjustment.
#[derive(Debug)]
pub struct AdjustmentOutcome {
    pub product_id: String,
    pub result: CoreResult<InventoryHistoryEntry>,
}

impl AdjustmentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct StockAdjustments {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl StockAdjustments {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        StockAdjustments { pool, retry }
    }

    /// Sets a product's stock to `new_stock`, recording the difference.
    ///
    /// A zero difference still writes an entry; the stocktake happened.
    ///
    /// ## Errors
    /// - `InsufficientStock` - `new_stock` is negative
    /// - `Validation` - `new_stock` is above the stock level ceiling
    /// - `NotFound` - product does not exist
    pub async fn adjust_stock(
        &self,
        session: &Session,
        product_id: &str,
        new_stock: i64,
        note: Option<&str>,
    ) -> CoreResult<InventoryHistoryEntry> {
        let actor = session.require_actor()?;
        validate_note(note)?;
        // Negative targets are reported as a shortfall by the planner.
        if new_stock >= 0 {
            validate_stock_level(new_stock)?;
        }

        let entry = retry_on_conflict(self.retry, "adjust_stock", move || {
            self.adjust_once(actor, product_id, new_stock, note)
        })
        .await?;

        info!(
            sku = %entry.sku,
            change = entry.change,
            stock_after = entry.stock_after,
            user = %actor,
            "Stock adjusted"
        );
        Ok(entry)
    }

    /// Applies independent adjustments, one transaction each, in input order.
    ///
    /// An anonymous session fails the whole batch before any line runs.
    /// Otherwise every line yields an outcome, successful or not.
    pub async fn adjust_stock_batch(
        &self,
        session: &Session,
        lines: &[AdjustmentDraft],
    ) -> CoreResult<Vec<AdjustmentOutcome>> {
        session.require_actor()?;

        let mut outcomes = Vec::with_capacity(lines.len());
        for line in lines {
            let result = self
                .adjust_stock(session, &line.product_id, line.new_stock, line.note.as_deref())
                .await;

            if let Err(err) = &result {
                warn!(product_id = %line.product_id, error = %err, "Batch adjustment line failed");
            }

            outcomes.push(AdjustmentOutcome {
                product_id: line.product_id.clone(),
                result,
            });
        }

        let applied = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(lines = lines.len(), applied, "Batch adjustment finished");
        Ok(outcomes)
    }

    async fn adjust_once(
        &self,
        actor: &ActorId,
        product_id: &str,
        new_stock: i64,
        note: Option<&str>,
    ) -> CoreResult<InventoryHistoryEntry> {
        let mut tx = begin(&self.pool).await?;

        let current = product::require_product(&mut tx, product_id).await?;
        let movement = plan_adjustment(&current, new_stock)?;

        let entry = history::record_movement(
            &mut tx,
            &movement,
            None,
            Some(note.unwrap_or(DEFAULT_ADJUSTMENT_NOTE)),
            actor,
            Utc::now(),
        )
        .await?;

        commit(tx).await?;
        Ok(entry)
    }
}
