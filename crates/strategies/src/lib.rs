//! # Swing Strategy
//!
//! The baseline-tracking buy-the-dip / sell-the-rise state machine.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of HTTP, databases or timers. The
//!   caller supplies each `PriceSnapshot` and the current time, and receives a
//!   `Decision`.
//! - **Commit After Confirmation:** `evaluate` never changes the position. The
//!   transition to `Long` or back to `Flat` happens only in `on_execution`, which
//!   the engine calls once an order is confirmed.
//!
//! ## Public API
//!
//! - `SwingStrategy`: The state machine.
//! - `BaselineState`: The single mutable state it owns.
//! - `Evaluation` / `Decision`: The per-tick outcome.

pub mod error;
pub mod state;
pub mod swing;

pub use error::StrategyError;
pub use state::{BaselineState, Decision, Evaluation};
pub use swing::SwingStrategy;
