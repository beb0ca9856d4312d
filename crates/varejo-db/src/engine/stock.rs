//! # Stock Ledger
//!
//! Manual stock movements: receiving (`in`), shrinkage (`out`) and physical
//! count corrections (`adjustment`). Every write to the `products.stock`
//! column lands here or in the sale engine, and every write appends a
//! ledger row in the same transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::engine::EngineResult;
use crate::repository::product::PRODUCT_COLUMNS;
use varejo_core::{validation, CoreError, MovementType, Product, StockMovement};

/// Applies manual stock movements and keeps the audit trail append-only.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Applies one movement to a product and records it.
    ///
    /// Semantics per movement type:
    /// * `In` - `quantity` added to stock
    /// * `Out` - `quantity` removed; fails with `InsufficientStock` rather
    ///   than letting committed stock go negative
    /// * `Adjustment` - `quantity` is the new absolute level (a physical
    ///   count), must be non-negative; the ledger row records the level set
    pub async fn apply_movement(
        &self,
        product_id: &str,
        movement_type: MovementType,
        quantity: i64,
        reason: &str,
        user_id: Option<&str>,
    ) -> EngineResult<StockMovement> {
        match movement_type {
            MovementType::Adjustment => validation::validate_adjustment_level(quantity)?,
            _ => validation::validate_quantity(quantity)?,
        }
        validation::validate_reason(reason)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        match movement_type {
            MovementType::In => {
                sqlx::query(
                    "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
                )
                .bind(product_id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            MovementType::Out => {
                let updated = sqlx::query(
                    r#"
                    UPDATE products
                    SET stock = stock - ?2, updated_at = ?3
                    WHERE id = ?1 AND stock >= ?2
                    "#,
                )
                .bind(product_id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(CoreError::InsufficientStock {
                        name: product.name,
                        available: product.stock,
                        requested: quantity,
                    }
                    .into());
                }
            }
            MovementType::Adjustment => {
                sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(product_id)
                    .bind(quantity)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            reason: reason.to_string(),
            user_id: user_id.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, product_id, movement_type, quantity, reason, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(&movement.user_id)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            product_id = %product_id,
            ?movement_type,
            quantity,
            "Stock movement applied"
        );

        Ok(movement)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::new_product;

    async fn db_with_product(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = new_product("Arroz", 2500, 1800, stock);
        db.products().insert(&product).await.unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_in_movement_adds() {
        let (db, pid) = db_with_product(10).await;

        let m = db
            .stock_ledger()
            .apply_movement(&pid, MovementType::In, 15, "Entrega fornecedor", None)
            .await
            .unwrap();
        assert_eq!(m.movement_type, MovementType::In);

        let stock = db.products().get_by_id(&pid).await.unwrap().unwrap().stock;
        assert_eq!(stock, 25);
    }

    #[tokio::test]
    async fn test_out_movement_floors_at_zero() {
        let (db, pid) = db_with_product(4).await;

        db.stock_ledger()
            .apply_movement(&pid, MovementType::Out, 3, "Quebra", None)
            .await
            .unwrap();
        let stock = db.products().get_by_id(&pid).await.unwrap().unwrap().stock;
        assert_eq!(stock, 1);

        // Taking out more than remains is rejected whole, not clamped
        let err = db
            .stock_ledger()
            .apply_movement(&pid, MovementType::Out, 2, "Quebra", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        let stock = db.products().get_by_id(&pid).await.unwrap().unwrap().stock;
        assert_eq!(stock, 1);
        // Failed movement leaves no ledger row
        assert_eq!(db.stock_movements().count_for_product(&pid).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjustment_sets_absolute_level() {
        let (db, pid) = db_with_product(10).await;

        db.stock_ledger()
            .apply_movement(&pid, MovementType::Adjustment, 3, "Contagem física", None)
            .await
            .unwrap();
        let stock = db.products().get_by_id(&pid).await.unwrap().unwrap().stock;
        assert_eq!(stock, 3);

        // Adjustment to zero is valid; negative is not
        db.stock_ledger()
            .apply_movement(&pid, MovementType::Adjustment, 0, "Zerado", None)
            .await
            .unwrap();
        let err = db
            .stock_ledger()
            .apply_movement(&pid, MovementType::Adjustment, -1, "Inválido", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_movement_requires_existing_product_and_reason() {
        let (db, pid) = db_with_product(5).await;

        let err = db
            .stock_ledger()
            .apply_movement("nope", MovementType::In, 1, "x", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ProductNotFound(_))
        ));

        let err = db
            .stock_ledger()
            .apply_movement(&pid, MovementType::In, 1, "", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));
    }
}
