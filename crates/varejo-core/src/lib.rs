//! # varejo-core: Pure Business Logic for Varejo POS
//!
//! This crate is the heart of the system. It contains the domain types and
//! business rules of a small retail store as pure, I/O-free code.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Varejo Architecture                            │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │            Web / UI layer (separate collaborator)             │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │              ★ varejo-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐  │ │
//! │  │   │  types   │  │  money   │  │  error   │  │ validation │  │ │
//! │  │   │ Product  │  │  Money   │  │ CoreError│  │   rules    │  │ │
//! │  │   │  Sale    │  │  cents   │  │          │  │            │  │ │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └────────────┘  │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │                  varejo-db (Database Layer)                   │ │
//! │  │        SQLite repositories, sale engine, stock ledger         │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, side-effect free
//! 2. **Integer Money**: all monetary values are cents (i64), never floats
//! 3. **Explicit Errors**: typed error enums, never strings or panics

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single item in one sale line.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of lines in a single sale.
pub const MAX_SALE_LINES: usize = 100;
