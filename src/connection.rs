//! Provider + signer pairing used to talk to the ledger.
//!
//! `LedgerTransport` is the seam between the bridge and whatever carries its calls to the
//! node: the JSON-RPC client in production, scripted mocks in tests. A `LedgerConnection`
//! binds one transport to the account that signs through it.

use crate::rpc::{CallRequest, Log, LogFilter, RpcError, TransactionReceipt, TransactionRequest};

use alloy_primitives::{Address, B256, Bytes};
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Stream of contract logs pushed by the node.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<Log, RpcError>> + Send>>;

/// Ledger operations the bridge needs from a node.
#[async_trait::async_trait]
pub trait LedgerTransport: Send + Sync {
	/// Execute a read-only call against the latest state.
	async fn call(&self, request: &CallRequest) -> Result<Bytes, RpcError>;

	/// Hand a write call to the wallet for signing and broadcast, returning its hash once it
	/// sits in the pending pool.
	async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcError>;

	/// Fetch the receipt of a transaction, `None` while it is still pending.
	async fn transaction_receipt(&self, hash: B256)
	-> Result<Option<TransactionReceipt>, RpcError>;

	/// Open a push subscription for logs matching `filter`.
	async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogStream, RpcError>;
}

/// A transport bound to one authorized account.
///
/// Shared read-only by the gateway and the synchronizer; replaced, never mutated, when the
/// active account changes.
#[derive(Clone)]
pub struct LedgerConnection {
	provider: Arc<dyn LedgerTransport>,
	signer: Address,
}

impl LedgerConnection {
	pub fn new(provider: Arc<dyn LedgerTransport>, signer: Address) -> Self {
		Self { provider, signer }
	}

	pub fn provider(&self) -> &Arc<dyn LedgerTransport> {
		&self.provider
	}

	/// Account every write through this connection is sent from.
	pub fn signer(&self) -> Address {
		self.signer
	}
}

impl fmt::Debug for LedgerConnection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LedgerConnection")
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}
