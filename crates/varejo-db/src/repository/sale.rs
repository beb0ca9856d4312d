//! # Sale Repository
//!
//! Read paths over sales. All writes to the sales table go through the
//! sale engine, which owns the transaction; this repository never mutates.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                │
//! │                                                                     │
//! │  SaleEngine::create_sale()                                          │
//! │     └── Sale { status: Completed }  (atomic: items + stock + ledger)│
//! │                                                                     │
//! │  SaleEngine::cancel_sale()          (step-up auth required)         │
//! │     └── Sale { status: Cancelled }  (stock restored, terminal)      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use varejo_core::{Sale, SaleItem};

pub(crate) const SALE_COLUMNS: &str = "id, customer_id, user_id, payment_method, total_cents, \
     discount_cents, notes, status, cancelled_at, cancellation_reason, cancelled_by, created_at";

/// Aggregates over a date range of completed sales.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalesSummary {
    /// Σ (total - discount) over completed sales in range.
    pub revenue_cents: i64,
    pub sales_count: i64,
    /// Σ (item price - current product cost) × quantity.
    pub profit_cents: i64,
}

impl SalesSummary {
    /// Average final total per sale; zero when there are no sales.
    pub fn average_ticket_cents(&self) -> i64 {
        if self.sales_count > 0 {
            self.revenue_cents / self.sales_count
        } else {
            0
        }
    }
}

/// Repository for sale read operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales in a date range, newest first. Includes cancelled sales:
    /// the listing is a history view, not a revenue figure.
    pub async fn list(
        &self,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at <= ?2)
            ORDER BY created_at DESC
            LIMIT ?3
            "#
        ))
        .bind(date_from)
        .bind(date_to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Latest sales regardless of status, for the history panel.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        self.list(None, None, limit).await
    }

    /// Revenue, count and profit over completed sales in a date range.
    ///
    /// Revenue uses `total - discount` uniformly. Profit uses the CURRENT
    /// product cost, so figures for old sales shift if costs are edited.
    pub async fn summary(
        &self,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COALESCE(SUM(s.total_cents - s.discount_cents), 0) AS revenue_cents,
                COUNT(s.id) AS sales_count,
                COALESCE((
                    SELECT SUM((si.price_cents - p.cost_cents) * si.quantity)
                    FROM sale_items si
                    JOIN sales s2 ON s2.id = si.sale_id
                    JOIN products p ON p.id = si.product_id
                    WHERE s2.status = 'completed'
                      AND (?1 IS NULL OR s2.created_at >= ?1)
                      AND (?2 IS NULL OR s2.created_at <= ?2)
                ), 0) AS profit_cents
            FROM sales s
            WHERE s.status = 'completed'
              AND (?1 IS NULL OR s.created_at >= ?1)
              AND (?2 IS NULL OR s.created_at <= ?2)
            "#,
        )
        .bind(date_from)
        .bind(date_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_ticket() {
        let summary = SalesSummary {
            revenue_cents: 9000,
            sales_count: 3,
            profit_cents: 3000,
        };
        assert_eq!(summary.average_ticket_cents(), 3000);

        let empty = SalesSummary {
            revenue_cents: 0,
            sales_count: 0,
            profit_cents: 0,
        };
        assert_eq!(empty.average_ticket_cents(), 0);
    }
}
