//!
//! Utility module for the wave bridge.
//!
//! Hosts the timestamp conversion helpers shared across the codebase.
/// Ledger timestamp conversion
pub mod time;

pub use time::epoch_seconds_to_datetime;
