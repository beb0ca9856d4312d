//! # Repository Module
//!
//! Database repository implementations for Varejo POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                             │
//! │    │  db.products().search("café", None, 20)                        │
//! │    ▼                                                                │
//! │  ProductRepository  ── SQL  ──►  SQLite                             │
//! │                                                                     │
//! │  Repositories own plain CRUD and read paths. Multi-table state      │
//! │  changes (sale creation/cancellation, audited stock movements)      │
//! │  belong to the engines, which own their transactions.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - category CRUD and listing
//! - [`product::ProductRepository`] - product CRUD, search, low-stock
//! - [`customer::CustomerRepository`] - customer CRUD and search
//! - [`sale::SaleRepository`] - sale read paths and range summaries
//! - [`stock::StockMovementRepository`] - ledger read path
//! - [`user::UserRepository`] - staff accounts and password verification

pub mod category;
pub mod customer;
pub mod product;
pub mod sale;
pub mod stock;
pub mod user;
