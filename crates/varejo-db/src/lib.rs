//! # varejo-db: Database Layer for Varejo POS
//!
//! SQLite storage and the transactional engines of the system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Varejo Data Flow                              │
//! │                                                                     │
//! │  Outer layer (web/UI, out of scope)                                 │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                   varejo-db (THIS CRATE)                      │ │
//! │  │                                                               │ │
//! │  │   ┌────────────┐   ┌──────────────┐   ┌────────────────────┐ │ │
//! │  │   │  Database  │   │ Repositories │   │      Engines       │ │ │
//! │  │   │ (pool.rs)  │   │ category,    │   │ SaleEngine         │ │ │
//! │  │   │ SqlitePool │◄──│ product,     │◄──│ StockLedger        │ │ │
//! │  │   │ migrations │   │ customer,    │   │ Dashboard          │ │ │
//! │  │   │            │   │ sale, stock, │   │ (transactional)    │ │ │
//! │  │   │            │   │ user         │   │                    │ │ │
//! │  │   └────────────┘   └──────────────┘   └────────────────────┘ │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode, foreign keys ON)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use varejo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./varejo.db")).await?;
//!
//! // CRUD through repositories
//! let low = db.products().list_low_stock().await?;
//!
//! // State changes through the engines
//! let sale = db.sale_engine().create_sale(new_sale).await?;
//! let stats = db.dashboard().stats(Utc::now()).await?;
//! ```

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use engine::dashboard::{BestSeller, Dashboard, DashboardStats, WindowStats};
pub use engine::sale::{NewSale, NewSaleLine, SaleEngine};
pub use engine::stock::StockLedger;
pub use engine::{EngineError, EngineResult};

pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockMovementRepository;
pub use repository::user::UserRepository;
