//! Wave bridge orchestrator and integration point for all bridge components.
//!
//! This module defines the `WaveBridge`, which owns the wallet session and the local mirror,
//! builds the contract gateway, and keeps exactly one event synchronizer bound to the
//! connected account. It is the surface a presentation layer drives:
//!
//! - `start` checks for an existing authorization, binds it and loads the mirror
//! - `connect` prompts the wallet, binds the account and loads the mirror
//! - `wave` / `wave_and_confirm` send messages to the contract
//! - `shutdown` tears the event subscription down
//!
//! Failures on the event delivery path are republished on a broadcast channel so they reach
//! the presentation layer like every other failure.

use crate::config::BridgeConfig;
use crate::contract::{
	Confirmation, ContractGateway, ContractRecord, GatewayConfig, NEW_WAVE_EVENT, TransactionHandle,
};
use crate::error::BridgeError;
use crate::mirror::MirrorStore;
use crate::rpc::{JsonRpcClient, RpcError};
use crate::sync::{EventSynchronizer, WaveEventHandler};
use crate::wallet::{WalletCapability, WalletSession};

use alloy_primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the failure channel before slow receivers start lagging.
const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// Event handler that appends delivered waves to the mirror.
struct MirrorAppender {
	store: Arc<MirrorStore>,
	failures: broadcast::Sender<BridgeError>,
}

impl WaveEventHandler for MirrorAppender {
	fn on_record(&self, record: ContractRecord) {
		self.store.append(record);
	}

	fn on_error(&self, error: BridgeError) {
		if self.failures.send(error).is_err() {
			debug!("No failure receivers attached");
		}
	}

	fn name(&self) -> &'static str {
		"MirrorAppender"
	}
}

pub struct WaveBridge {
	session: Arc<WalletSession>,
	store: Arc<MirrorStore>,
	gateway: Option<ContractGateway>,
	synchronizer: Option<EventSynchronizer>,
	failures: broadcast::Sender<BridgeError>,
}

impl WaveBridge {
	/// Create a bridge. `capability` is `None` when no wallet is available; the bridge still
	/// exists and reports `NoWalletCapability` from every operation that needs one.
	pub fn new(config: GatewayConfig, capability: Option<WalletCapability>) -> Self {
		let session = Arc::new(WalletSession::new(capability));
		let gateway = ContractGateway::new(session.clone(), config).ok();
		let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);

		Self {
			session,
			store: Arc::new(MirrorStore::new()),
			gateway,
			synchronizer: None,
			failures,
		}
	}

	/// Create a bridge talking JSON-RPC to the configured node.
	pub fn from_config(config: &BridgeConfig) -> Result<Self, RpcError> {
		let client = JsonRpcClient::new(
			config.rpc_url.clone(),
			config.ws_url.clone(),
			config.request_timeout,
		)?;
		Ok(Self::new(
			config.gateway(),
			Some(WalletCapability::from_client(client)),
		))
	}

	pub fn session(&self) -> &Arc<WalletSession> {
		&self.session
	}

	pub fn store(&self) -> &Arc<MirrorStore> {
		&self.store
	}

	pub fn gateway(&self) -> Result<&ContractGateway, BridgeError> {
		self.gateway.as_ref().ok_or(BridgeError::NoWalletCapability)
	}

	/// Failures raised on the event delivery path.
	pub fn failures(&self) -> broadcast::Receiver<BridgeError> {
		self.failures.subscribe()
	}

	pub fn is_subscribed(&self) -> bool {
		self.synchronizer
			.as_ref()
			.is_some_and(EventSynchronizer::is_subscribed)
	}

	/// Mount sequence: reuse an existing authorization if there is one, then load the mirror.
	///
	/// # Returns
	/// The account found, or `None` if the user still has to connect.
	pub async fn start(&mut self) -> Result<Option<Address>, BridgeError> {
		let account = self.session.check_existing_authorization().await?;

		if account.is_some() {
			self.rebind().await?;
			self.refresh_records().await?;
		}
		self.refresh_total_count().await?;

		Ok(account)
	}

	/// Prompt the wallet, bind the authorized account and reload the mirror.
	pub async fn connect(&mut self) -> Result<Address, BridgeError> {
		let account = self.session.request_connection().await?;
		self.rebind().await?;
		self.refresh().await?;
		Ok(account)
	}

	/// Bind the event synchronizer to the session's current account.
	///
	/// No-op when already bound to that account. Otherwise the previous subscription is torn
	/// down before the new one is opened.
	pub async fn rebind(&mut self) -> Result<(), BridgeError> {
		let connection = self.session.connection()?;

		if let Some(synchronizer) = &self.synchronizer {
			if synchronizer.connection().signer() == connection.signer()
				&& synchronizer.is_subscribed()
			{
				return Ok(());
			}
		}

		if let Some(mut previous) = self.synchronizer.take() {
			info!(
				"Releasing subscription bound to {}",
				previous.connection().signer()
			);
			previous.unsubscribe();
		}

		let gateway = self.gateway()?.clone();
		let mut synchronizer = EventSynchronizer::new(connection, gateway, self.store.clone());
		synchronizer
			.subscribe(
				NEW_WAVE_EVENT,
				Arc::new(MirrorAppender {
					store: self.store.clone(),
					failures: self.failures.clone(),
				}),
			)
			.await?;

		self.synchronizer = Some(synchronizer);
		Ok(())
	}

	/// Reload both the wave log and the counter from the contract.
	pub async fn refresh(&self) -> Result<(), BridgeError> {
		self.refresh_records().await?;
		self.refresh_total_count().await?;
		Ok(())
	}

	/// Replace the mirrored log with the contract's current collection.
	pub async fn refresh_records(&self) -> Result<usize, BridgeError> {
		let records = self.gateway()?.read_all().await?;
		let count = records.len();
		self.store.replace_all(records);
		Ok(count)
	}

	pub async fn refresh_total_count(&self) -> Result<u64, BridgeError> {
		let total_count = self.gateway()?.read_total_count().await?;
		info!("Retrieved total wave count... {}", total_count);
		self.store.set_total_count(total_count);
		Ok(total_count)
	}

	/// Send a wave. Returns once the transaction is pending.
	pub async fn wave(&self, message: impl Into<String>) -> Result<TransactionHandle, BridgeError> {
		self.gateway()?.submit(message).await
	}

	/// Send a wave and wait until it is mined.
	pub async fn wave_and_confirm(
		&self,
		message: impl Into<String>,
		timeout: Option<Duration>,
	) -> Result<Confirmation, BridgeError> {
		let gateway = self.gateway()?;
		let handle = gateway.submit(message).await?;
		gateway.await_confirmation(&handle, timeout).await
	}

	/// Tear down the event subscription. Safe to call repeatedly.
	pub fn shutdown(&mut self) {
		if let Some(mut synchronizer) = self.synchronizer.take() {
			synchronizer.unsubscribe();
		}
	}
}
