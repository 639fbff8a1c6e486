//! Types for JSON-RPC ledger integration

use alloy_primitives::{Address, B256, Bytes};
use alloy_serde::quantity;
use serde::{Deserialize, Serialize};

/// EIP-1193 error code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Fragments nodes and wallets use when a call runs past its gas ceiling.
const GAS_EXHAUSTION_MARKERS: &[&str] = &[
    "out of gas",
    "gas required exceeds",
    "intrinsic gas too low",
    "exceeds block gas limit",
    "gas limit reached",
];

/// Outgoing JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Error object carried by a failed JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Incoming JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

/// Push notification for an `eth_subscribe` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionNotification {
    pub method: String,
    pub params: SubscriptionParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionParams {
    pub subscription: String,
    pub result: serde_json::Value,
}

/// Read-only call against a contract (`eth_call`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// Write call handed to the wallet for signing and broadcast (`eth_sendTransaction`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    /// Explicit gas ceiling attached to the call.
    #[serde(with = "quantity")]
    pub gas: u64,
}

/// Log filter used for `eth_subscribe("logs", ..)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
}

/// A contract log as delivered by the node, either in a receipt or through a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default, with = "quantity::opt")]
    pub log_index: Option<u64>,
    /// Set by the node when a chain reorganisation drops the log.
    #[serde(default)]
    pub removed: bool,
}

impl Log {
    /// Identity of this log occurrence on chain, when the node reported one.
    pub fn occurrence(&self) -> Option<(B256, u64)> {
        Some((self.transaction_hash?, self.log_index?))
    }
}

/// Receipt for a mined transaction (`eth_getTransactionReceipt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    /// `1` on success, `0` on revert. Absent on pre-byzantium chains.
    #[serde(default, with = "quantity::opt")]
    pub status: Option<u64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Check if the transaction executed successfully
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

/// Error types for JSON-RPC transport operations
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("No data returned")]
    NoData,

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Subscription error: {0}")]
    SubscriptionError(String),
}

impl RpcError {
    /// The wallet declined the request (EIP-1193 code 4001).
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }

    /// The node refused the call because it would exceed its gas ceiling.
    pub fn is_gas_exhaustion(&self) -> bool {
        match self {
            RpcError::Rpc { message, .. } => {
                let message = message.to_ascii_lowercase();
                GAS_EXHAUSTION_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }
}

impl From<JsonRpcErrorObject> for RpcError {
    fn from(error: JsonRpcErrorObject) -> Self {
        RpcError::Rpc {
            code: error.code,
            message: error.message,
        }
    }
}
