use super::abi::WavePortal;
use crate::error::BridgeError;
use crate::rpc::TransactionReceipt;
use crate::utils::epoch_seconds_to_datetime;

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default gas ceiling attached to `wave` calls.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// A wave as mirrored locally. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
	pub sender: Address,
	pub timestamp: DateTime<Utc>,
	pub message: String,
}

impl ContractRecord {
	pub fn new(sender: Address, timestamp: U256, message: String) -> Result<Self, BridgeError> {
		let timestamp = epoch_seconds_to_datetime(timestamp).ok_or_else(|| {
			BridgeError::ReadFailure(format!("Timestamp {timestamp} is out of range"))
		})?;
		Ok(Self {
			sender,
			timestamp,
			message,
		})
	}
}

impl TryFrom<WavePortal::Wave> for ContractRecord {
	type Error = BridgeError;

	fn try_from(wave: WavePortal::Wave) -> Result<Self, Self::Error> {
		Self::new(wave.waver, wave.timestamp, wave.message)
	}
}

impl TryFrom<WavePortal::NewWave> for ContractRecord {
	type Error = BridgeError;

	fn try_from(event: WavePortal::NewWave) -> Result<Self, Self::Error> {
		Self::new(event.from, event.timestamp, event.message)
	}
}

/// A write call accepted into the pending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle {
	pub hash: B256,
	pub from: Address,
	/// Gas ceiling the transaction was sent with.
	pub gas_limit: u64,
}

/// Outcome of waiting for a transaction to be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
	Confirmed(TransactionReceipt),
	Failed {
		receipt: TransactionReceipt,
		/// The transaction burned its entire gas ceiling.
		ceiling_exhausted: bool,
	},
}

impl Confirmation {
	pub fn receipt(&self) -> &TransactionReceipt {
		match self {
			Confirmation::Confirmed(receipt) | Confirmation::Failed { receipt, .. } => receipt,
		}
	}

	pub fn is_confirmed(&self) -> bool {
		matches!(self, Confirmation::Confirmed(_))
	}
}

/// Receipt polling schedule for `await_confirmation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
	pub initial_poll_interval: Duration,
	pub max_poll_interval: Duration,
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			initial_poll_interval: Duration::from_millis(500),
			max_poll_interval: Duration::from_secs(5),
		}
	}
}

/// Configuration for the contract gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	pub contract_address: Address,
	/// Gas ceiling attached to every write call.
	pub gas_limit: u64,
	pub confirmation: ConfirmationConfig,
}

impl GatewayConfig {
	pub fn new(contract_address: Address) -> Self {
		Self {
			contract_address,
			gas_limit: DEFAULT_GAS_LIMIT,
			confirmation: ConfirmationConfig::default(),
		}
	}

	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = gas_limit;
		self
	}

	pub fn with_confirmation(mut self, confirmation: ConfirmationConfig) -> Self {
		self.confirmation = confirmation;
		self
	}
}
