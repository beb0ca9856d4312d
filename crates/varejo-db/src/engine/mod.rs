//! # Engine Module
//!
//! The transactional heart of the system. Repositories do plain CRUD;
//! engines own every multi-table state change and run it inside a single
//! transaction so a failure anywhere leaves zero trace.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  SaleEngine     create_sale / cancel_sale                           │
//! │                 (sale + items + stock + ledger, atomically)         │
//! │                                                                     │
//! │  StockLedger    apply_movement                                      │
//! │                 (counter mutation + ledger append, atomically)      │
//! │                                                                     │
//! │  Dashboard      stats / windows                                     │
//! │                 (read-only aggregation, no mutation)                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::error::DbError;
use varejo_core::CoreError;

pub mod dashboard;
pub mod sale;
pub mod stock;

/// Errors returned by the engines: either a business rule violation or a
/// storage failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<varejo_core::ValidationError> for EngineError {
    fn from(err: varejo_core::ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
