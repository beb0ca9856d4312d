//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Stock Is Not Edited Here
//! `products.stock` is an eagerly-maintained counter whose every change must
//! carry a ledger entry. The catalog [`update`](ProductRepository::update)
//! deliberately leaves `stock` alone; the sale engine and the stock ledger
//! are the only writers of that column.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use varejo_core::{validation, Product};

/// Columns selected for every product read, in struct order.
pub(crate) const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price_cents, cost_cents, \
     stock, min_stock, barcode, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - empty name, negative price or cost
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validation::validate_name(&product.name)?;
        validation::validate_price_cents(product.price_cents)?;
        validation::validate_price_cents(product.cost_cents)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, description,
                price_cents, cost_cents, stock, min_stock,
                barcode, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Searches active products by substring across name, barcode and
    /// description, optionally restricted to one category.
    ///
    /// An empty query lists active products sorted by name.
    pub async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, category = ?category_id, "Searching products");

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (?1 = '' OR name LIKE ?2 OR barcode LIKE ?2 OR description LIKE ?2)
              AND (?3 IS NULL OR category_id = ?3)
            ORDER BY name
            LIMIT ?4
            "#
        ))
        .bind(query)
        .bind(&pattern)
        .bind(category_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's catalog fields. `stock` is intentionally not
    /// touched; it belongs to the sale engine and the stock ledger.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validation::validate_name(&product.name)?;
        validation::validate_price_cents(product.price_cents)?;
        validation::validate_price_cents(product.cost_cents)?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                min_stock = ?7,
                barcode = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale items still reference this product (RESTRICT policy),
    /// so rows are never removed from the table.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists active products at or below their minimum stock threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1 AND stock <= min_stock
            ORDER BY name
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics and seed checks).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Builds a product with generated id and timestamps, ready for insert.
pub fn new_product(name: &str, price_cents: i64, cost_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        category_id: None,
        name: name.to_string(),
        description: String::new(),
        price_cents,
        cost_cents,
        stock,
        min_stock: 5,
        barcode: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
