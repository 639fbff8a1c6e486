//! Delivery tracking for contract event subscriptions.
//!
//! This module provides the `DeliveryTracker`, which decides whether a log pushed by the node
//! is a new event occurrence, a repeat, or a reorg removal, and keeps counters for logging.
//! Nodes may push the same log more than once (reconnects, reorgs that re-include a
//! transaction); the tracker makes sure each occurrence reaches the handler only once.

use alloy_primitives::B256;
use std::collections::HashSet;
use tracing::info;

use crate::rpc::Log;

/// Verdict for an incoming log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting of this occurrence.
    Deliver,
    /// Already delivered earlier.
    Duplicate,
    /// The node retracted the log after a reorg.
    Removed,
}

/// Service for tracking delivered event occurrences
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    /// Occurrences already handed to the handler, keyed by (transaction hash, log index)
    seen: HashSet<(B256, u64)>,
    /// Total records delivered
    delivered: usize,
    /// Logs skipped because they repeated an earlier occurrence
    duplicates: usize,
    /// Logs skipped because the node flagged them as removed
    removed: usize,
    /// Stream items that failed or did not decode
    failures: usize,
    /// Highest block a delivered log came from
    highest_block: Option<u64>,
    /// Delivered count at the last progress log
    last_logged: usize,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a log. Only occurrences passed to `record_delivered` count as seen, so a log
    /// that failed to decode is still admitted when the node sends it again.
    ///
    /// Logs without an occurrence key (pending logs) are always delivered.
    pub fn admit(&mut self, log: &Log) -> Admission {
        if log.removed {
            self.removed += 1;
            return Admission::Removed;
        }

        if log
            .occurrence()
            .is_some_and(|occurrence| self.seen.contains(&occurrence))
        {
            self.duplicates += 1;
            return Admission::Duplicate;
        }

        Admission::Deliver
    }

    /// Record a log that was handed to the handler
    pub fn record_delivered(&mut self, log: &Log) {
        if let Some(occurrence) = log.occurrence() {
            self.seen.insert(occurrence);
        }
        self.delivered += 1;
        if let Some(block) = log.block_number {
            self.highest_block = Some(self.highest_block.map_or(block, |h| h.max(block)));
        }
    }

    /// Record a stream error or an undecodable log
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Log progress every 100 deliveries or when forced
    pub fn log_progress(&mut self, force: bool) {
        let should_log = force || self.delivered.saturating_sub(self.last_logged) >= 100;

        if should_log {
            info!("Event delivery: {}", self.stats().summary());
            self.last_logged = self.delivered;
        }
    }

    /// Get delivery statistics as a DeliveryStats struct
    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered,
            duplicates: self.duplicates,
            removed: self.removed,
            failures: self.failures,
            highest_block: self.highest_block,
        }
    }
}

/// Statistics about event delivery on one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub duplicates: usize,
    pub removed: usize,
    pub failures: usize,
    pub highest_block: Option<u64>,
}

impl DeliveryStats {
    /// Get a human-readable summary of the delivery statistics
    pub fn summary(&self) -> String {
        format!(
            "{} delivered, {} duplicates, {} removed, {} failures{}",
            self.delivered,
            self.duplicates,
            self.removed,
            self.failures,
            match self.highest_block {
                Some(block) => format!(" (up to block {block})"),
                None => String::new(),
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    fn log(tx: u8, index: u64, block: u64) -> Log {
        Log {
            address: Address::ZERO,
            topics: vec![],
            data: Bytes::new(),
            block_hash: Some(B256::repeat_byte(0xaa)),
            block_number: Some(block),
            transaction_hash: Some(B256::repeat_byte(tx)),
            log_index: Some(index),
            removed: false,
        }
    }

    #[test]
    fn repeats_are_rejected() {
        let mut tracker = DeliveryTracker::new();

        assert_eq!(tracker.admit(&log(1, 0, 10)), Admission::Deliver);
        tracker.record_delivered(&log(1, 0, 10));
        assert_eq!(tracker.admit(&log(1, 1, 10)), Admission::Deliver);
        tracker.record_delivered(&log(1, 1, 10));
        assert_eq!(tracker.admit(&log(1, 0, 10)), Admission::Duplicate);
        assert_eq!(tracker.stats().duplicates, 1);
    }

    #[test]
    fn undelivered_log_is_admitted_again() {
        let mut tracker = DeliveryTracker::new();

        assert_eq!(tracker.admit(&log(4, 0, 10)), Admission::Deliver);
        tracker.record_failure();
        assert_eq!(tracker.admit(&log(4, 0, 10)), Admission::Deliver);
        tracker.record_delivered(&log(4, 0, 10));
        assert_eq!(tracker.admit(&log(4, 0, 10)), Admission::Duplicate);
    }

    #[test]
    fn reincluded_log_after_removal_is_not_redelivered() {
        let mut tracker = DeliveryTracker::new();
        let original = log(2, 0, 10);
        let mut retracted = original.clone();
        retracted.removed = true;

        assert_eq!(tracker.admit(&original), Admission::Deliver);
        tracker.record_delivered(&original);
        assert_eq!(tracker.admit(&retracted), Admission::Removed);
        assert_eq!(tracker.admit(&log(2, 0, 11)), Admission::Duplicate);
    }

    #[test]
    fn pending_logs_always_pass() {
        let mut tracker = DeliveryTracker::new();
        let mut pending = log(3, 0, 0);
        pending.transaction_hash = None;
        pending.log_index = None;

        assert_eq!(tracker.admit(&pending), Admission::Deliver);
        assert_eq!(tracker.admit(&pending), Admission::Deliver);
    }

    #[test]
    fn stats_track_highest_block() {
        let mut tracker = DeliveryTracker::new();
        tracker.record_delivered(&log(1, 0, 12));
        tracker.record_delivered(&log(2, 0, 9));
        tracker.record_failure();

        let stats = tracker.stats();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.highest_block, Some(12));
        assert_eq!(
            stats.summary(),
            "2 delivered, 0 duplicates, 0 removed, 1 failures (up to block 12)"
        );
    }
}
