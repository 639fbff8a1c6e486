//! Event Synchronization Module
//!
//! This module keeps the local mirror in step with contract events pushed by the node:
//!
//! - `synchronizer`: Owns the log subscription and the delivery task for one connection.
//! - `events`: Handler trait and decoding of raw logs into mirrored records.
//! - `delivery_tracker`: Filters repeated and retracted logs and keeps delivery statistics.

/// Handler trait and log decoding
pub mod events;
/// Per-subscription occurrence tracking
pub mod delivery_tracker;
/// Subscription lifecycle and delivery task
pub mod synchronizer;

pub use events::{WaveEventHandler, decode_new_wave, event_topic};
pub use synchronizer::{EventSubscription, EventSynchronizer};
