//! Event handling for contract log delivery.
//!
//! This module defines the handler trait the synchronizer reports to, and the decoding of raw
//! logs into mirrored records. Handlers are the only channel through which the background
//! delivery path talks to the rest of the application, so both records and failures flow
//! through them.

use crate::contract::{ContractRecord, NEW_WAVE_EVENT, WavePortal};
use crate::error::BridgeError;
use crate::rpc::Log;

use alloy_primitives::B256;
use alloy_sol_types::SolEvent;

/// Receiver of decoded contract events.
///
/// Implementors must not call back into the synchronizer that delivers to them;
/// `on_record` runs while the delivery gate is held.
pub trait WaveEventHandler: Send + Sync {
    /// Called exactly once per distinct event occurrence, in transport order.
    fn on_record(&self, record: ContractRecord);

    /// Called for failures on the delivery path (stream errors, undecodable logs, counter
    /// refresh failures).
    fn on_error(&self, error: BridgeError) {
        tracing::error!("Handler {} dropped delivery failure: {}", self.name(), error);
    }

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str {
        "anonymous"
    }
}

impl<F> WaveEventHandler for F
where
    F: Fn(ContractRecord) + Send + Sync,
{
    fn on_record(&self, record: ContractRecord) {
        self(record)
    }
}

/// Topic that selects `event_name` logs.
///
/// # Errors
/// `UnknownEvent` for names the WavePortal ABI does not declare.
pub fn event_topic(event_name: &str) -> Result<B256, BridgeError> {
    if event_name == NEW_WAVE_EVENT {
        Ok(WavePortal::NewWave::SIGNATURE_HASH)
    } else {
        Err(BridgeError::UnknownEvent(event_name.to_string()))
    }
}

/// Decode a `NewWave` log into a record.
pub fn decode_new_wave(log: &Log) -> Result<ContractRecord, BridgeError> {
    let event = WavePortal::NewWave::decode_raw_log(log.topics.iter().copied(), &log.data, true)
        .map_err(|e| BridgeError::ReadFailure(format!("Failed to decode NewWave log: {e}")))?;

    ContractRecord::try_from(event)
}
