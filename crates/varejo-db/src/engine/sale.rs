//! # Sale Engine
//!
//! Creation and cancellation of sales.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  create_sale - ONE transaction                                      │
//! │                                                                     │
//! │  BEGIN                                                              │
//! │    INSERT sale shell                                                │
//! │    for each line (in input order):                                  │
//! │      SELECT product          ← sees earlier lines' decrements       │
//! │      stock check             ← InsufficientStock aborts everything  │
//! │      INSERT sale_item        (price captured at sale time)          │
//! │      UPDATE stock - qty      (guarded: stock >= qty)                │
//! │      INSERT stock_movement   (type out, "Sale #<id>")               │
//! │    UPDATE sale total                                                │
//! │  COMMIT                                                             │
//! │                                                                     │
//! │  Any failure rolls back: no sale, no items, no movements, no        │
//! │  stock change. Committed stock never goes negative.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation is the one-way `completed → cancelled` transition. It is a
//! privileged operation: the actor re-authenticates with their password and
//! must be a superuser.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::EngineResult;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::sale::SALE_COLUMNS;
use crate::repository::user::verify_password;
use varejo_core::{
    validation, CoreError, PaymentMethod, Product, Sale, SaleItem, SaleStatus, User,
};

/// One requested line of a new sale.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for [`SaleEngine::create_sale`].
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub discount_cents: i64,
    pub notes: String,
    /// Creating cashier, recorded on the sale and on every movement.
    pub user_id: Option<String>,
    pub lines: Vec<NewSaleLine>,
}

/// The transactional engine for the sale lifecycle.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
}

impl SaleEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine { pool }
    }

    /// Creates a sale: items, stock decrements and ledger entries in one
    /// atomic transaction.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - empty lines, bad quantity, negative discount
    /// * `CoreError::ProductNotFound` - a line references a missing product
    /// * `CoreError::InsufficientStock` - a line exceeds current stock; the
    ///   whole sale is aborted and nothing is persisted
    pub async fn create_sale(&self, new: NewSale) -> EngineResult<Sale> {
        validation::validate_sale_lines(new.lines.len())?;
        validation::validate_discount_cents(new.discount_cents)?;
        for line in &new.lines {
            validation::validate_quantity(line.quantity)?;
        }

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(sale_id = %sale_id, lines = new.lines.len(), "Creating sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, user_id, payment_method,
                total_cents, discount_cents, notes, status,
                cancelled_at, cancellation_reason, cancelled_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, 'completed', NULL, '', NULL, ?7)
            "#,
        )
        .bind(&sale_id)
        .bind(&new.customer_id)
        .bind(&new.user_id)
        .bind(new.payment_method)
        .bind(new.discount_cents)
        .bind(&new.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut total_cents: i64 = 0;

        for line in &new.lines {
            // Re-read inside the transaction: a sale with the same product
            // twice sees the first line's decrement before the second check.
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if product.stock < line.quantity {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id.clone(),
                quantity: line.quantity,
                // Price captured at sale time, decoupled from later edits
                price_cents: product.price_cents,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, product_id, quantity, price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .execute(&mut *tx)
            .await?;

            // The guard in the UPDATE keeps committed stock non-negative
            // even if another writer slipped in between check and write.
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&product.id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            insert_movement(
                &mut tx,
                &product.id,
                "out",
                line.quantity,
                &format!("Sale #{}", sale_id),
                new.user_id.as_deref(),
            )
            .await?;

            total_cents += item.price_cents * item.quantity;
        }

        sqlx::query("UPDATE sales SET total_cents = ?2 WHERE id = ?1")
            .bind(&sale_id)
            .bind(total_cents)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total_cents,
            lines = new.lines.len(),
            "Sale created"
        );

        Ok(Sale {
            id: sale_id,
            customer_id: new.customer_id,
            user_id: new.user_id,
            payment_method: new.payment_method,
            total_cents,
            discount_cents: new.discount_cents,
            notes: new.notes,
            status: SaleStatus::Completed,
            cancelled_at: None,
            cancellation_reason: String::new(),
            cancelled_by: None,
            created_at: now,
        })
    }

    /// Cancels a sale, restoring stock and appending reversal movements.
    ///
    /// Step-up authentication: `actor_id` + `password` are re-verified
    /// against the stored argon2 hash, and the actor must be an active
    /// superuser. Ordinary session login is not enough for this operation.
    ///
    /// ## Errors
    /// * `CoreError::NotAuthorized` - bad password, unknown actor, or no
    ///   superuser privilege; no state change
    /// * `CoreError::SaleNotFound`
    /// * `CoreError::AlreadyCancelled` - cancelled is terminal
    pub async fn cancel_sale(
        &self,
        sale_id: &str,
        actor_id: &str,
        password: &str,
        reason: &str,
    ) -> EngineResult<Sale> {
        let actor = self.authorize_cancellation(actor_id, password).await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.is_cancelled() {
            return Err(CoreError::AlreadyCancelled(sale_id.to_string()).into());
        }

        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Status guard makes the transition race-safe: the second of two
        // concurrent cancellations updates zero rows.
        let updated = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'cancelled',
                cancelled_at = ?2,
                cancellation_reason = ?3,
                cancelled_by = ?4
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .bind(reason)
        .bind(&actor.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::AlreadyCancelled(sale_id.to_string()).into());
        }

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&item.product_id)
                .bind(item.quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            insert_movement(
                &mut tx,
                &item.product_id,
                "in",
                item.quantity,
                &format!("Cancellation of Sale #{} - {}", sale_id, reason),
                Some(&actor.id),
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            actor = %actor.username,
            items = items.len(),
            "Sale cancelled, stock restored"
        );

        Ok(Sale {
            status: SaleStatus::Cancelled,
            cancelled_at: Some(now),
            cancellation_reason: reason.to_string(),
            cancelled_by: Some(actor.id),
            ..sale
        })
    }

    /// Verifies the step-up credentials for cancellation.
    async fn authorize_cancellation(&self, actor_id: &str, password: &str) -> EngineResult<User> {
        let actor = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_superuser, is_active, created_at \
             FROM users WHERE id = ?1",
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?;

        match actor {
            Some(user)
                if user.is_active
                    && user.is_superuser
                    && verify_password(password, &user.password_hash) =>
            {
                Ok(user)
            }
            _ => {
                debug!(actor_id = %actor_id, "Cancellation authorization failed");
                Err(CoreError::NotAuthorized.into())
            }
        }
    }
}

/// Loads a product inside the transaction.
async fn fetch_product(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Appends a ledger entry inside the transaction.
async fn insert_movement(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    movement_type: &str,
    quantity: i64,
    reason: &str,
    user_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, movement_type, quantity, reason, user_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(movement_type)
    .bind(quantity)
    .bind(reason)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
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
    use varejo_core::MovementType;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sale_of(product_id: &str, quantity: i64) -> NewSale {
        NewSale {
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            discount_cents: 0,
            notes: String::new(),
            user_id: None,
            lines: vec![NewSaleLine {
                product_id: product_id.to_string(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_sale_decrements_stock_and_audits() {
        let db = db().await;
        let product = new_product("Café", 10000, 6000, 10);
        db.products().insert(&product).await.unwrap();

        let sale = db.sale_engine().create_sale(sale_of(&product.id, 3)).await.unwrap();

        assert_eq!(sale.total_cents, 30000);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.final_total().cents(), 30000);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 7);
        assert!(!stored.is_low_stock()); // min_stock 5, stock 7

        let movements = db.stock_movements().list(Some(product.id.as_str()), 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Out);
        assert_eq!(movements[0].quantity, 3);
        assert_eq!(movements[0].reason, format!("Sale #{}", sale.id));
    }

    #[tokio::test]
    async fn test_price_captured_at_sale_time() {
        let db = db().await;
        let mut product = new_product("Leite", 500, 300, 10);
        db.products().insert(&product).await.unwrap();

        let sale = db.sale_engine().create_sale(sale_of(&product.id, 2)).await.unwrap();

        // Edit the price afterwards; the sale item keeps the old price
        product.price_cents = 999;
        db.products().update(&product).await.unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_cents, 500);
        assert_eq!(items[0].subtotal().cents(), 1000);

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_zero_trace() {
        let db = db().await;
        let product = new_product("Pão", 50, 20, 2);
        db.products().insert(&product).await.unwrap();

        let err = db.sale_engine().create_sale(sale_of(&product.id, 5)).await.unwrap_err();
        match err {
            EngineError::Core(CoreError::InsufficientStock {
                name,
                available,
                requested,
            }) => {
                assert_eq!(name, "Pão");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Post-fix invariant: stock, ledger and sale table all unchanged
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
        assert_eq!(db.stock_movements().count_for_product(&product.id).await.unwrap(), 0);
        assert!(db.sales().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_product_twice_shares_stock() {
        let db = db().await;
        let product = new_product("Água", 300, 100, 5);
        db.products().insert(&product).await.unwrap();

        // 3 + 3 > 5: the second line sees the first line's decrement
        let new = NewSale {
            lines: vec![
                NewSaleLine {
                    product_id: product.id.clone(),
                    quantity: 3,
                },
                NewSaleLine {
                    product_id: product.id.clone(),
                    quantity: 3,
                },
            ],
            ..sale_of(&product.id, 0)
        };

        let err = db.sale_engine().create_sale(new).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { available: 2, .. })
        ));

        // Whole sale rolled back, including the first (valid) line
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
    }

    #[tokio::test]
    async fn test_empty_and_invalid_lines_rejected() {
        let db = db().await;

        let empty = NewSale {
            customer_id: None,
            payment_method: PaymentMethod::Pix,
            discount_cents: 0,
            notes: String::new(),
            user_id: None,
            lines: vec![],
        };
        assert!(matches!(
            db.sale_engine().create_sale(empty).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));

        let product = new_product("X", 100, 50, 10);
        db.products().insert(&product).await.unwrap();
        assert!(matches!(
            db.sale_engine().create_sale(sale_of(&product.id, 0)).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));

        let mut negative_discount = sale_of(&product.id, 1);
        negative_discount.discount_cents = -100;
        assert!(matches!(
            db.sale_engine().create_sale(negative_discount).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = db().await;
        let err = db
            .sale_engine()
            .create_sale(sale_of("missing-id", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let db = db().await;
        let admin = db.users().insert("gerente", "senha-forte", true).await.unwrap();
        let product = new_product("Queijo", 2000, 1200, 10);
        db.products().insert(&product).await.unwrap();

        let sale = db.sale_engine().create_sale(sale_of(&product.id, 4)).await.unwrap();
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 6);

        let cancelled = db
            .sale_engine()
            .cancel_sale(&sale.id, &admin.id, "senha-forte", "cliente desistiu")
            .await
            .unwrap();
        assert!(cancelled.is_cancelled());
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.cancelled_by.as_deref(), Some(admin.id.as_str()));
        // Historical total preserved for audit
        assert_eq!(cancelled.total_cents, 8000);

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);

        let movements = db.stock_movements().list(Some(product.id.as_str()), 10).await.unwrap();
        assert_eq!(movements.len(), 2); // out + in
        let reversal = movements
            .iter()
            .find(|m| m.movement_type == MovementType::In)
            .unwrap();
        assert_eq!(reversal.quantity, 4);
        assert_eq!(
            reversal.reason,
            format!("Cancellation of Sale #{} - cliente desistiu", sale.id)
        );

        // Cancelled is terminal: second attempt is rejected, state unchanged
        let err = db
            .sale_engine()
            .cancel_sale(&sale.id, &admin.id, "senha-forte", "de novo")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::AlreadyCancelled(_))
        ));
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
    }

    #[tokio::test]
    async fn test_cancel_requires_superuser_password() {
        let db = db().await;
        let admin = db.users().insert("gerente", "senha", true).await.unwrap();
        let cashier = db.users().insert("caixa", "outra", false).await.unwrap();
        let product = new_product("Vinho", 5000, 3000, 8);
        db.products().insert(&product).await.unwrap();

        let sale = db.sale_engine().create_sale(sale_of(&product.id, 2)).await.unwrap();

        // Wrong password
        let err = db
            .sale_engine()
            .cancel_sale(&sale.id, &admin.id, "errada", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::NotAuthorized)));

        // Right password, but not a superuser
        let err = db
            .sale_engine()
            .cancel_sale(&sale.id, &cashier.id, "outra", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::NotAuthorized)));

        // No state change from either attempt
        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Completed);
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 6);
    }

    #[tokio::test]
    async fn test_cancel_missing_sale() {
        let db = db().await;
        let admin = db.users().insert("gerente", "senha", true).await.unwrap();

        let err = db
            .sale_engine()
            .cancel_sale("no-such-sale", &admin.id, "senha", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
    }
}
