//! # Audit Database Crate
//!
//! An append-only trail of what the trading loop saw and did: every trade it
//! executed, every price sample it acted on and every error it recorded.
//!
//! ## Public API
//!
//! - `connect`: Opens the SQLite connection pool, creating the file if needed.
//! - `run_migrations`: Applies the embedded schema.
//! - `DbRepository`: Insert helpers for the three record kinds, plus read-only
//!   `recent_*` queries for the dashboard.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, ErrorRecord, PriceRecord, TradeRecord};
