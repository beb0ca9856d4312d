//! # Dashboard
//!
//! Rolling-window reporting over the sales history.
//!
//! All figures count completed sales only. Revenue uses the post-discount
//! total (`total - discount`); profit is the per-item margin against the
//! product's *current* acquisition cost, since item cost is not captured at
//! sale time.
//!
//! Windows are closed intervals `[start, as_of]`, anchored at day boundaries
//! of the `as_of` instant:
//! * today: since midnight
//! * week:  last 7 days
//! * month: last 30 days
//! * year:  since January 1st

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::engine::EngineResult;
use crate::repository::product::PRODUCT_COLUMNS;
use crate::repository::sale::SALE_COLUMNS;
use varejo_core::{Product, Sale};

/// Aggregates for one reporting window.
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct WindowStats {
    /// Post-discount revenue of completed sales, in cents.
    pub revenue_cents: i64,
    /// Σ (item price - current product cost) × quantity, in cents.
    pub profit_cents: i64,
    /// Number of completed sales.
    pub sales_count: i64,
}

/// One row of the best-sellers ranking.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BestSeller {
    pub product_id: String,
    pub name: String,
    /// Units sold in completed sales within the window.
    pub total_sold: i64,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub today: WindowStats,
    pub week: WindowStats,
    pub month: WindowStats,
    pub year: WindowStats,
    /// Active products at or below their minimum stock.
    pub low_stock: Vec<Product>,
    /// Top 5 products by units sold across all completed sales.
    pub best_sellers: Vec<BestSeller>,
    /// Latest 10 sales, cancelled ones included.
    pub recent_sales: Vec<Sale>,
}

/// Read-only reporting over sales, stock and the product catalog.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pool: SqlitePool,
}

impl Dashboard {
    pub fn new(pool: SqlitePool) -> Self {
        Dashboard { pool }
    }

    /// Builds the complete dashboard as of the given instant.
    pub async fn stats(&self, as_of: DateTime<Utc>) -> EngineResult<DashboardStats> {
        let day_start = as_of.date_naive().and_time(NaiveTime::MIN).and_utc();
        let week_start = day_start - Duration::days(7);
        let month_start = day_start - Duration::days(30);
        let year_start = day_start - Duration::days(as_of.ordinal0() as i64);

        let today = self.window_stats(day_start, as_of).await?;
        let week = self.window_stats(week_start, as_of).await?;
        let month = self.window_stats(month_start, as_of).await?;
        let year = self.window_stats(year_start, as_of).await?;

        let low_stock = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND stock <= min_stock \
             ORDER BY stock ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let best_sellers = self.best_sellers(5).await?;

        let recent_sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC LIMIT 10"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            today,
            week,
            month,
            year,
            low_stock,
            best_sellers,
            recent_sales,
        })
    }

    /// Revenue, profit and count of completed sales within `[start, end]`.
    pub async fn window_stats(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<WindowStats> {
        let stats = sqlx::query_as::<_, WindowStats>(
            r#"
            SELECT
                COALESCE(SUM(s.total_cents - s.discount_cents), 0) AS revenue_cents,
                COALESCE((
                    SELECT SUM((si.price_cents - p.cost_cents) * si.quantity)
                    FROM sale_items si
                    JOIN sales s2 ON s2.id = si.sale_id
                    JOIN products p ON p.id = si.product_id
                    WHERE s2.status = 'completed'
                      AND s2.created_at >= ?1 AND s2.created_at <= ?2
                ), 0) AS profit_cents,
                COUNT(*) AS sales_count
            FROM sales s
            WHERE s.status = 'completed'
              AND s.created_at >= ?1 AND s.created_at <= ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Products ranked by units sold across all completed sales. The ranking
    /// is all-time; only the window aggregates are date-bounded.
    pub async fn best_sellers(&self, limit: i64) -> EngineResult<Vec<BestSeller>> {
        let rows = sqlx::query_as::<_, BestSeller>(
            r#"
            SELECT p.id AS product_id, p.name AS name, SUM(si.quantity) AS total_sold
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.status = 'completed'
            GROUP BY p.id, p.name
            ORDER BY total_sold DESC, p.name ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sale::{NewSale, NewSaleLine};
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::new_product;
    use varejo_core::PaymentMethod;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sale_of(lines: Vec<(String, i64)>, discount_cents: i64) -> NewSale {
        NewSale {
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            discount_cents,
            notes: String::new(),
            user_id: None,
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| NewSaleLine {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_window_revenue_and_profit() {
        let db = db().await;
        let product = new_product("Café", 10000, 6000, 20);
        db.products().insert(&product).await.unwrap();

        // 3 × 100,00 with 5,00 discount: revenue 295,00, margin 3 × 40,00
        db.sale_engine()
            .create_sale(sale_of(vec![(product.id.clone(), 3)], 500))
            .await
            .unwrap();

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();
        assert_eq!(stats.today.revenue_cents, 29500);
        assert_eq!(stats.today.profit_cents, 3 * (10000 - 6000));
        assert_eq!(stats.today.sales_count, 1);

        // Today's sale is inside every wider window
        assert_eq!(stats.week.revenue_cents, 29500);
        assert_eq!(stats.month.revenue_cents, 29500);
        assert_eq!(stats.year.revenue_cents, 29500);
    }

    #[tokio::test]
    async fn test_cancelled_sales_excluded_everywhere() {
        let db = db().await;
        let admin = db.users().insert("gerente", "senha", true).await.unwrap();
        let product = new_product("Café", 10000, 6000, 20);
        db.products().insert(&product).await.unwrap();

        let kept = db
            .sale_engine()
            .create_sale(sale_of(vec![(product.id.clone(), 1)], 0))
            .await
            .unwrap();
        let doomed = db
            .sale_engine()
            .create_sale(sale_of(vec![(product.id.clone(), 3)], 0))
            .await
            .unwrap();

        db.sale_engine()
            .cancel_sale(&doomed.id, &admin.id, "senha", "erro de digitação")
            .await
            .unwrap();

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();

        // Only the kept sale counts: revenue 100,00, profit 40,00
        assert_eq!(stats.today.revenue_cents, 10000);
        assert_eq!(stats.today.profit_cents, 4000);
        assert_eq!(stats.today.sales_count, 1);

        // Best sellers count the kept sale's single unit, not the 3 cancelled
        assert_eq!(stats.best_sellers.len(), 1);
        assert_eq!(stats.best_sellers[0].total_sold, 1);

        // Recent sales still show the cancelled one for audit
        assert_eq!(stats.recent_sales.len(), 2);
        assert!(stats
            .recent_sales
            .iter()
            .any(|s| s.id == doomed.id && s.is_cancelled()));
        assert!(stats.recent_sales.iter().any(|s| s.id == kept.id));
    }

    #[tokio::test]
    async fn test_best_sellers_top_five() {
        let db = db().await;

        let mut ids = Vec::new();
        for i in 0..7 {
            let product = new_product(&format!("Produto {i}"), 1000, 500, 100);
            db.products().insert(&product).await.unwrap();
            ids.push(product.id);
        }

        // Product i sells i+1 units; ranking is descending
        for (i, id) in ids.iter().enumerate() {
            db.sale_engine()
                .create_sale(sale_of(vec![(id.clone(), (i + 1) as i64)], 0))
                .await
                .unwrap();
        }

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();
        assert_eq!(stats.best_sellers.len(), 5);
        assert_eq!(stats.best_sellers[0].total_sold, 7);
        assert_eq!(stats.best_sellers[0].name, "Produto 6");
        assert_eq!(stats.best_sellers[4].total_sold, 3);
    }

    #[tokio::test]
    async fn test_best_sellers_include_old_sales() {
        let db = db().await;
        let product = new_product("Clássico", 1000, 500, 100);
        db.products().insert(&product).await.unwrap();

        let sale = db
            .sale_engine()
            .create_sale(sale_of(vec![(product.id.clone(), 8)], 0))
            .await
            .unwrap();

        // Age the sale past every reporting window
        sqlx::query("UPDATE sales SET created_at = ?2 WHERE id = ?1")
            .bind(&sale.id)
            .bind(Utc::now() - Duration::days(40))
            .execute(db.pool())
            .await
            .unwrap();

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();

        // Out of the month window for revenue, but the all-time ranking keeps it
        assert_eq!(stats.month.sales_count, 0);
        assert_eq!(stats.best_sellers.len(), 1);
        assert_eq!(stats.best_sellers[0].total_sold, 8);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = db().await;

        let healthy = new_product("Cheio", 1000, 500, 50);
        let mut low = new_product("Baixo", 1000, 500, 5);
        low.min_stock = 5; // boundary equality counts as low
        let mut inactive = new_product("Inativo", 1000, 500, 0);
        inactive.is_active = false;

        db.products().insert(&healthy).await.unwrap();
        db.products().insert(&low).await.unwrap();
        db.products().insert(&inactive).await.unwrap();

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();
        assert_eq!(stats.low_stock.len(), 1);
        assert_eq!(stats.low_stock[0].name, "Baixo");
    }

    #[tokio::test]
    async fn test_empty_database_yields_zeroes() {
        let db = db().await;
        let stats = db.dashboard().stats(Utc::now()).await.unwrap();

        assert_eq!(stats.today.revenue_cents, 0);
        assert_eq!(stats.today.profit_cents, 0);
        assert_eq!(stats.year.sales_count, 0);
        assert!(stats.low_stock.is_empty());
        assert!(stats.best_sellers.is_empty());
        assert!(stats.recent_sales.is_empty());
    }
}
