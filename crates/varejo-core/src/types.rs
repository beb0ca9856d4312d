//! # Domain Types
//!
//! Core domain types for the Varejo POS system.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Model                                │
//! │                                                                     │
//! │  Category ◄──(SET NULL)── Product ◄──(RESTRICT)── SaleItem         │
//! │                              ▲                        │             │
//! │                              │                        │ (CASCADE)   │
//! │                       StockMovement                   ▼             │
//! │                       (append-only)                 Sale ──► Customer│
//! │                                                       │   (SET NULL)│
//! │                                                       ▼             │
//! │                                                     User            │
//! │                                                                     │
//! │  Product.stock is an eagerly-maintained counter; its history is     │
//! │  reconstructable from the StockMovement ledger.                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries a UUID v4 `id` (String) used for database relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid for.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash (dinheiro).
    Cash,
    /// Debit card.
    Debit,
    /// Credit card.
    Credit,
    /// PIX instant payment.
    Pix,
    /// Bank transfer.
    BankTransfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// This is the only state machine in the system:
/// `Completed → Cancelled`, one-way, terminal at `Cancelled`.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is finalized and counts towards revenue.
    Completed,
    /// Sale was cancelled with stock restored; kept for audit.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Stock Movement Type
// =============================================================================

/// What a stock movement does to the product counter.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received: `stock += quantity`.
    In,
    /// Stock leaving (sale or manual removal): `stock -= quantity`.
    Out,
    /// Inventory count correction: `stock = quantity` (absolute, not relative).
    Adjustment,
}

// =============================================================================
// Staff User
// =============================================================================

/// A staff account.
///
/// Full user management is delegated to an external collaborator; this record
/// exists for attribution on sales/movements and for the step-up password
/// check required to cancel a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC-format hash. Never the plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Elevated privilege required for sale cancellation.
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Deleting one leaves its products uncategorized.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning category; nulled out when the category is deleted.
    pub category_id: Option<String>,

    pub name: String,
    pub description: String,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Acquisition cost in cents (for profit calculations).
    pub cost_cents: i64,

    /// Current stock level. Eagerly maintained; every change is audited
    /// by a StockMovement row written in the same transaction.
    pub stock: i64,

    /// Alert threshold: at or below this the product counts as low stock.
    pub min_stock: i64,

    /// Barcode (EAN-13 etc.), unique when present.
    pub barcode: Option<String>,

    /// Soft-delete marker. Inactive products are hidden, never hard-deleted,
    /// because historical sale items still reference them.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the acquisition cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// True when stock is at or below the configured minimum (boundary
    /// equality counts as low).
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Profit margin as a percentage: `(price - cost) / cost * 100`.
    ///
    /// Returns 0 when cost is zero or negative, matching the business rule
    /// that margin over an unknown cost is meaningless.
    pub fn profit_margin(&self) -> f64 {
        if self.cost_cents > 0 {
            (self.price_cents - self.cost_cents) as f64 / self.cost_cents as f64 * 100.0
        } else {
            0.0
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record. Passive data referenced (not owned) by sales.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Brazilian tax id, unique when present.
    pub cpf: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction.
///
/// `total_cents` is fixed at creation time from line-item prices captured at
/// sale time, not live product prices. After creation a sale is an immutable
/// financial record except for the cancellation transition.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Optional customer; nulled if the customer is deleted.
    pub customer_id: Option<String>,
    /// Creating cashier; nulled if the user is deleted.
    pub user_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Sum of line subtotals, before discount.
    pub total_cents: i64,
    pub discount_cents: i64,
    pub notes: String,
    pub status: SaleStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: String,
    pub cancelled_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Total after discount: `total - discount`.
    ///
    /// Preserved for audit even on cancelled sales; reporting excludes
    /// cancelled sales by status, not by zeroing the total.
    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.total_cents - self.discount_cents)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status == SaleStatus::Cancelled
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale. Lifetime equals the sale's lifetime (CASCADE).
///
/// `price_cents` is the unit price captured at sale time, decoupled from the
/// product's current price.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

impl SaleItem {
    /// Unit price at sale time as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// `quantity × price`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An immutable audit entry for a stock change.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// For In/Out: the delta applied. For Adjustment: the absolute level set.
    pub quantity: i64,
    /// Free text, e.g. "Sale #<id>" or "Inventory count".
    pub reason: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
