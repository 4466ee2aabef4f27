//! # Status Events
//!
//! The live status of the trading loop, as shown on the dashboard.
//!
//! One writer (the engine) overwrites a single `StatusRecord` every tick through a
//! `StatusPublisher`; any number of `StatusReader`s take cloned snapshots of the
//! latest value. Readers never block the writer.

pub mod publisher;
pub mod status;

pub use publisher::{StatusPublisher, StatusReader};
pub use status::StatusRecord;
