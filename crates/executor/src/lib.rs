//! # Executor Crate
//!
//! Turns an `OrderRequest` into a confirmed `Execution`.
//!
//! ## Architectural Principles
//!
//! - **Execution Abstraction:** The `Executor` trait lets the live engine stay
//!   agnostic about whether orders reach the exchange (`LiveExecutor`) or are
//!   filled on paper at the quoted price (`PaperExecutor`, used for dry runs).
//! - **Confirmation Only:** An `Ok(Execution)` means the exchange accepted the
//!   order. Callers commit state changes only after receiving one.
//!
//! ## Public API
//!
//! - `Executor`: The core trait for all execution engines.
//! - `LiveExecutor`: Places market orders through an `ApiClient`.
//! - `PaperExecutor`: The dry-run executor.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod exchange;

pub use error::ExecutorError;
pub use exchange::{Executor, LiveExecutor, PaperExecutor};
