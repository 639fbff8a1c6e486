use crate::connection::LedgerTransport;
use crate::rpc::{JsonRpcClient, RpcError};

use alloy_primitives::Address;
use std::sync::Arc;

/// Account authorization surface of an external wallet (EIP-1193 style).
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
	/// Accounts the user already authorized, without prompting (`eth_accounts`).
	async fn accounts(&self) -> Result<Vec<Address>, RpcError>;

	/// Prompt the user to authorize accounts (`eth_requestAccounts`).
	async fn request_accounts(&self) -> Result<Vec<Address>, RpcError>;
}

/// The wallet capability: authorization plus the transport that signs and broadcasts
/// through the wallet.
#[derive(Clone)]
pub struct WalletCapability {
	pub wallet: Arc<dyn WalletProvider>,
	pub ledger: Arc<dyn LedgerTransport>,
}

impl WalletCapability {
	pub fn new(wallet: Arc<dyn WalletProvider>, ledger: Arc<dyn LedgerTransport>) -> Self {
		Self { wallet, ledger }
	}

	/// Use one JSON-RPC client for both roles.
	pub fn from_client(client: JsonRpcClient) -> Self {
		let client = Arc::new(client);
		Self {
			wallet: client.clone(),
			ledger: client,
		}
	}
}
