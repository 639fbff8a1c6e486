//!
//! Typed read and write calls against the WavePortal contract.
//!
//! Reads go out as `eth_call` and never need the wallet to sign. Writes are handed to the
//! wallet with an explicit gas ceiling and return as soon as the node assigns a hash;
//! confirmation is a separate wait so callers stay responsive while a transaction is mined.

use super::abi::WavePortal;
use super::types::{Confirmation, ContractRecord, GatewayConfig, TransactionHandle};
use crate::connection::LedgerTransport;
use crate::error::BridgeError;
use crate::rpc::{CallRequest, TransactionRequest};
use crate::wallet::WalletSession;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use backoff::ExponentialBackoffBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Gateway to one fixed contract address.
#[derive(Clone)]
pub struct ContractGateway {
	session: Arc<WalletSession>,
	ledger: Arc<dyn LedgerTransport>,
	config: GatewayConfig,
}

impl ContractGateway {
	/// Create a gateway reading through the session's wallet capability.
	///
	/// # Errors
	/// `NoWalletCapability` if the session has no wallet to talk through.
	pub fn new(session: Arc<WalletSession>, config: GatewayConfig) -> Result<Self, BridgeError> {
		let ledger = session.ledger().ok_or(BridgeError::NoWalletCapability)?;
		Ok(Self {
			session,
			ledger,
			config,
		})
	}

	pub fn address(&self) -> Address {
		self.config.contract_address
	}

	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, BridgeError> {
		let request = CallRequest {
			from: self.session.account(),
			to: self.config.contract_address,
			data: call.abi_encode().into(),
		};

		let output = self
			.ledger
			.call(&request)
			.await
			.map_err(BridgeError::read_failure)?;

		C::abi_decode_returns(&output, true).map_err(|e| {
			BridgeError::ReadFailure(format!("Failed to decode {} output: {}", C::SIGNATURE, e))
		})
	}

	/// Fetch every wave stored by the contract, in contract order.
	pub async fn read_all(&self) -> Result<Vec<ContractRecord>, BridgeError> {
		let waves = self.call(WavePortal::getAllWavesCall {}).await?._0;
		debug!("Retrieved {} waves", waves.len());

		waves.into_iter().map(ContractRecord::try_from).collect()
	}

	/// Fetch the contract's wave counter.
	pub async fn read_total_count(&self) -> Result<u64, BridgeError> {
		let count = self.call(WavePortal::getTotalWavesCall {}).await?._0;
		debug!("Retrieved total wave count {}", count);

		u64::try_from(count)
			.map_err(|_| BridgeError::ReadFailure(format!("Wave count {count} does not fit in u64")))
	}

	/// Send a `wave(message)` transaction through the connected wallet.
	///
	/// The message is passed through unchanged. Returns once the transaction has a hash; use
	/// [`ContractGateway::await_confirmation`] to wait for inclusion.
	///
	/// # Errors
	/// `NotConnected` when no account is connected (nothing is sent), `Underfunded` when the
	/// node reports the gas ceiling would be exceeded, `SubmissionRejected` otherwise.
	pub async fn submit(&self, message: impl Into<String>) -> Result<TransactionHandle, BridgeError> {
		let connection = self.session.connection()?;

		let call = WavePortal::waveCall {
			_message: message.into(),
		};
		let data = call.abi_encode();
		debug!("wave calldata 0x{}", hex::encode(&data));

		let request = TransactionRequest {
			from: connection.signer(),
			to: self.config.contract_address,
			data: data.into(),
			gas: self.config.gas_limit,
		};

		let hash = connection
			.provider()
			.send_transaction(&request)
			.await
			.map_err(|e| {
				warn!("Wave submission failed: {}", e);
				BridgeError::from_submission(e)
			})?;

		info!("Mining... {}", hash);
		Ok(TransactionHandle {
			hash,
			from: connection.signer(),
			gas_limit: self.config.gas_limit,
		})
	}

	/// Wait until the transaction is included in a block.
	///
	/// Polls for the receipt on an exponential schedule. With `timeout` set, gives up with
	/// `ConfirmationTimeout` once the full timeout has passed without a receipt; without it,
	/// waits indefinitely.
	pub async fn await_confirmation(
		&self,
		handle: &TransactionHandle,
		timeout: Option<Duration>,
	) -> Result<Confirmation, BridgeError> {
		let policy = ExponentialBackoffBuilder::new()
			.with_initial_interval(self.config.confirmation.initial_poll_interval)
			.with_max_interval(self.config.confirmation.max_poll_interval)
			.with_max_elapsed_time(None)
			.build();

		let ledger = self.ledger.clone();
		let hash = handle.hash;
		let started = Instant::now();
		let poll = backoff::future::retry(policy, || {
			let ledger = ledger.clone();
			async move {
				match ledger.transaction_receipt(hash).await {
					Ok(Some(receipt)) => Ok(receipt),
					Ok(None) => {
						debug!("Transaction {} still pending", hash);
						Err(backoff::Error::transient(BridgeError::ReadFailure(format!(
							"Transaction {hash} is still pending"
						))))
					}
					Err(e) => Err(backoff::Error::permanent(BridgeError::read_failure(e))),
				}
			}
		});

		let receipt = match timeout {
			None => poll.await?,
			Some(limit) => match tokio::time::timeout(limit, poll).await {
				Ok(result) => result?,
				// The deadline may fall between two polls; look once more before giving up.
				Err(_) => match self
					.ledger
					.transaction_receipt(hash)
					.await
					.map_err(BridgeError::read_failure)?
				{
					Some(receipt) => receipt,
					None => {
						let waited = started.elapsed();
						warn!("Transaction {} not mined after {:?}", hash, waited);
						return Err(BridgeError::ConfirmationTimeout { hash, waited });
					}
				},
			},
		};

		if receipt.succeeded() {
			info!("Mined -- {}", hash);
			Ok(Confirmation::Confirmed(receipt))
		} else {
			let ceiling_exhausted = receipt.gas_used >= handle.gas_limit;
			warn!(
				"Transaction {} failed in block {:?} (gas used {} of {})",
				hash, receipt.block_number, receipt.gas_used, handle.gas_limit
			);
			Ok(Confirmation::Failed {
				receipt,
				ceiling_exhausted,
			})
		}
	}
}
