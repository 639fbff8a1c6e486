use crate::rpc::RpcError;

use alloy_primitives::B256;
use std::time::Duration;

/// Failures surfaced by the bridge to the presentation layer.
///
/// Transport errors are flattened to their message so the error can be cloned onto the
/// failure channel and rendered as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
	#[error("No wallet capability available")]
	NoWalletCapability,

	#[error("Wallet authorization was rejected by the user")]
	UserRejected,

	#[error("Wallet is not connected")]
	NotConnected,

	#[error("Read failure: {0}")]
	ReadFailure(String),

	#[error("Submission rejected: {0}")]
	SubmissionRejected(String),

	#[error("Transaction exceeds its gas ceiling: {0}")]
	Underfunded(String),

	#[error("Transaction {hash} not confirmed within {waited:?}")]
	ConfirmationTimeout { hash: B256, waited: Duration },

	#[error("Already subscribed to {0}")]
	DuplicateSubscription(String),

	#[error("Unknown contract event: {0}")]
	UnknownEvent(String),

	#[error("Subscription failure: {0}")]
	SubscriptionFailure(String),
}

impl BridgeError {
	/// Classify a failed write call.
	pub fn from_submission(error: RpcError) -> Self {
		if error.is_gas_exhaustion() {
			BridgeError::Underfunded(error.to_string())
		} else {
			BridgeError::SubmissionRejected(error.to_string())
		}
	}

	pub fn read_failure(error: impl std::fmt::Display) -> Self {
		BridgeError::ReadFailure(error.to_string())
	}
}
