//! # Stock Movement Repository
//!
//! Read path over the append-only stock ledger. Writes happen only inside
//! the sale engine and the stock ledger engine; there is deliberately no
//! update or delete here at all.

use sqlx::SqlitePool;

use crate::error::DbResult;
use varejo_core::StockMovement;

const MOVEMENT_COLUMNS: &str =
    "id, product_id, movement_type, quantity, reason, user_id, created_at";

/// Repository for reading the stock ledger.
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    /// Lists ledger entries, newest first, optionally for one product.
    pub async fn list(
        &self,
        product_id: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE (?1 IS NULL OR product_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts ledger entries for a product (diagnostics and tests).
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
