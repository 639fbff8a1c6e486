//! Wallet authorization state machine.
//!
//! `Disconnected --check_existing_authorization(found)--> Connected`
//! `Disconnected --request_connection(success)--> Connected`
//!
//! No transition back to `Disconnected` exists; account switches reported by the wallet are
//! not tracked. Observers follow the state through a `watch` channel and re-acquire their
//! `LedgerConnection` whenever the connected account changes.

use super::provider::WalletCapability;
use super::types::{SessionState, SessionStatus};
use crate::connection::{LedgerConnection, LedgerTransport};
use crate::error::BridgeError;

use alloy_primitives::Address;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

pub struct WalletSession {
	capability: Option<WalletCapability>,
	state: watch::Sender<SessionState>,
	/// Held for the whole prompt so overlapping requests run one after another.
	prompt: Mutex<()>,
}

impl WalletSession {
	/// Create a disconnected session. `None` models a host without any wallet installed.
	pub fn new(capability: Option<WalletCapability>) -> Self {
		let (state, _) = watch::channel(SessionState::Disconnected);
		Self {
			capability,
			state,
			prompt: Mutex::new(()),
		}
	}

	pub fn state(&self) -> SessionState {
		*self.state.borrow()
	}

	pub fn status(&self) -> SessionStatus {
		self.state().status()
	}

	pub fn account(&self) -> Option<Address> {
		self.state().account()
	}

	pub fn has_wallet_capability(&self) -> bool {
		self.capability.is_some()
	}

	/// Follow state changes.
	pub fn watch(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	/// Transport for unsigned reads. Available whenever a wallet capability exists, connected
	/// or not.
	pub fn ledger(&self) -> Option<Arc<dyn LedgerTransport>> {
		self.capability.as_ref().map(|capability| capability.ledger.clone())
	}

	/// Query already-authorized accounts without prompting the user.
	///
	/// # Returns
	/// The first authorized account, or `None` if the user has not authorized this origin yet.
	///
	/// # Errors
	/// `NoWalletCapability` when no wallet is present (non-fatal for callers),
	/// `ReadFailure` when the wallet cannot be queried.
	pub async fn check_existing_authorization(&self) -> Result<Option<Address>, BridgeError> {
		let capability = self.capability.as_ref().ok_or_else(|| {
			warn!("No wallet capability present, make sure a wallet is available");
			BridgeError::NoWalletCapability
		})?;

		let accounts = capability
			.wallet
			.accounts()
			.await
			.map_err(BridgeError::read_failure)?;

		match accounts.first() {
			Some(account) => {
				info!("Found an authorized account: {}", account);
				self.set_connected(*account);
				Ok(Some(*account))
			}
			None => {
				debug!("No authorized account found");
				Ok(None)
			}
		}
	}

	/// Actively ask the wallet for authorization, which may prompt the user.
	///
	/// # Errors
	/// `NoWalletCapability` when no wallet is present, `UserRejected` when the user declines or
	/// the wallet hands back no account, `ReadFailure` on transport errors. The session returns
	/// to its previous state on any failure. Concurrent calls are served one at a time.
	pub async fn request_connection(&self) -> Result<Address, BridgeError> {
		let capability = self
			.capability
			.as_ref()
			.ok_or(BridgeError::NoWalletCapability)?;

		let _prompt = self.prompt.lock().await;
		let previous = self.state.send_replace(SessionState::Connecting);

		let result = match capability.wallet.request_accounts().await {
			Ok(accounts) => accounts.first().copied().ok_or(BridgeError::UserRejected),
			Err(e) if e.is_user_rejection() => Err(BridgeError::UserRejected),
			Err(e) => Err(BridgeError::read_failure(e)),
		};

		match result {
			Ok(account) => {
				info!("Connected {}", account);
				self.set_connected(account);
				Ok(account)
			}
			Err(e) => {
				warn!("Wallet connection failed: {}", e);
				self.state.send_replace(previous);
				Err(e)
			}
		}
	}

	/// Bind the ledger transport to the connected account.
	pub fn connection(&self) -> Result<LedgerConnection, BridgeError> {
		let SessionState::Connected(account) = self.state() else {
			return Err(BridgeError::NotConnected);
		};
		let ledger = self.ledger().ok_or(BridgeError::NoWalletCapability)?;
		Ok(LedgerConnection::new(ledger, account))
	}

	fn set_connected(&self, account: Address) {
		self.state.send_if_modified(|state| {
			if *state == SessionState::Connected(account) {
				return false;
			}
			*state = SessionState::Connected(account);
			true
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::connection::LogStream;
	use crate::rpc::{CallRequest, LogFilter, RpcError, TransactionReceipt, TransactionRequest};
	use crate::wallet::WalletProvider;
	use alloy_primitives::{B256, Bytes, address};
	use std::collections::VecDeque;
	use std::time::Duration;

	const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");

	struct ScriptedWallet {
		authorized: Vec<Address>,
		on_request: Result<Vec<Address>, i64>,
	}

	#[async_trait::async_trait]
	impl WalletProvider for ScriptedWallet {
		async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
			Ok(self.authorized.clone())
		}

		async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
			self.on_request.clone().map_err(|code| RpcError::Rpc {
				code,
				message: "request failed".to_string(),
			})
		}
	}

	/// Answers prompts in order, each after its own delay.
	struct QueuedWallet {
		answers: std::sync::Mutex<VecDeque<(Duration, Result<Vec<Address>, i64>)>>,
	}

	#[async_trait::async_trait]
	impl WalletProvider for QueuedWallet {
		async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
			Ok(vec![])
		}

		async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
			let (delay, answer) = self.answers.lock().unwrap().pop_front().unwrap();
			tokio::time::sleep(delay).await;
			answer.map_err(|code| RpcError::Rpc {
				code,
				message: "request failed".to_string(),
			})
		}
	}

	struct UnusedLedger;

	#[async_trait::async_trait]
	impl LedgerTransport for UnusedLedger {
		async fn call(&self, _: &CallRequest) -> Result<Bytes, RpcError> {
			Err(RpcError::NoData)
		}

		async fn send_transaction(&self, _: &TransactionRequest) -> Result<B256, RpcError> {
			Err(RpcError::NoData)
		}

		async fn transaction_receipt(&self, _: B256) -> Result<Option<TransactionReceipt>, RpcError> {
			Ok(None)
		}

		async fn subscribe_logs(&self, _: &LogFilter) -> Result<LogStream, RpcError> {
			Err(RpcError::NoData)
		}
	}

	fn session(authorized: Vec<Address>, on_request: Result<Vec<Address>, i64>) -> WalletSession {
		WalletSession::new(Some(WalletCapability::new(
			Arc::new(ScriptedWallet {
				authorized,
				on_request,
			}),
			Arc::new(UnusedLedger),
		)))
	}

	#[tokio::test]
	async fn existing_authorization_connects_without_prompt() {
		let session = session(vec![ACCOUNT], Err(4001));

		let found = session.check_existing_authorization().await.unwrap();

		assert_eq!(found, Some(ACCOUNT));
		assert_eq!(session.state(), SessionState::Connected(ACCOUNT));
		assert_eq!(session.connection().unwrap().signer(), ACCOUNT);
	}

	#[tokio::test]
	async fn no_authorized_account_stays_disconnected() {
		let session = session(vec![], Err(4001));

		assert_eq!(session.check_existing_authorization().await.unwrap(), None);
		assert_eq!(session.status(), SessionStatus::Disconnected);
		assert!(matches!(session.connection(), Err(BridgeError::NotConnected)));
	}

	#[tokio::test]
	async fn missing_wallet_is_reported_not_fatal() {
		let session = WalletSession::new(None);

		assert_eq!(
			session.check_existing_authorization().await,
			Err(BridgeError::NoWalletCapability)
		);
		assert_eq!(
			session.request_connection().await,
			Err(BridgeError::NoWalletCapability)
		);
		assert_eq!(session.status(), SessionStatus::Disconnected);
	}

	#[tokio::test]
	async fn rejected_prompt_leaves_session_disconnected() {
		let session = session(vec![], Err(4001));
		let watcher = session.watch();

		assert_eq!(session.request_connection().await, Err(BridgeError::UserRejected));
		assert_eq!(session.status(), SessionStatus::Disconnected);
		assert_eq!(*watcher.borrow(), SessionState::Disconnected);
	}

	#[tokio::test]
	async fn empty_account_list_counts_as_rejection() {
		let session = session(vec![], Ok(vec![]));

		assert_eq!(session.request_connection().await, Err(BridgeError::UserRejected));
		assert_eq!(session.account(), None);
	}

	#[tokio::test]
	async fn accepted_prompt_notifies_watchers() {
		let session = session(vec![], Ok(vec![ACCOUNT]));
		let mut watcher = session.watch();

		assert_eq!(session.request_connection().await, Ok(ACCOUNT));
		assert!(watcher.has_changed().unwrap());
		assert_eq!(*watcher.borrow_and_update(), SessionState::Connected(ACCOUNT));
	}

	#[tokio::test(start_paused = true)]
	async fn overlapping_prompts_do_not_strand_the_session() {
		let wallet = QueuedWallet {
			answers: std::sync::Mutex::new(VecDeque::from([
				(Duration::from_millis(10), Ok(vec![ACCOUNT])),
				(Duration::from_millis(50), Err(4001)),
			])),
		};
		let session = WalletSession::new(Some(WalletCapability::new(
			Arc::new(wallet),
			Arc::new(UnusedLedger),
		)));

		let (first, second) = tokio::join!(session.request_connection(), session.request_connection());

		assert_eq!(first, Ok(ACCOUNT));
		assert_eq!(second, Err(BridgeError::UserRejected));
		assert_eq!(session.state(), SessionState::Connected(ACCOUNT));
	}
}
