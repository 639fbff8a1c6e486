//!
//! JSON-RPC client for an Ethereum-compatible node and the wallet behind it.
//!
//! This module provides an async client speaking JSON-RPC 2.0 over HTTP for calls and
//! transactions, and over WebSocket for `eth_subscribe` log streams. It implements both the
//! `LedgerTransport` and `WalletProvider` seams so one client can serve as the complete wallet
//! capability. All methods are async and designed for use with Tokio.

use super::types::*;
use crate::connection::{LedgerTransport, LogStream};
use crate::wallet::WalletProvider;

use alloy_primitives::{Address, B256, Bytes};
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_tungstenite::{
	connect_async,
	tungstenite::{Message, client::IntoClientRequest},
};
use tracing::{debug, error, info};

/// JSON-RPC ledger client
#[derive(Clone)]
pub struct JsonRpcClient {
	/// The underlying HTTP client for request/response calls.
	http_client: Client,
	/// The HTTP endpoint of the node.
	rpc_url: String,
	/// The WebSocket endpoint used for subscriptions.
	ws_url: String,
	/// Request id counter shared between clones.
	next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
	/// Create a new JSON-RPC client.
	///
	/// # Arguments
	/// * `rpc_url` - The HTTP endpoint for calls and transactions.
	/// * `ws_url` - The WebSocket endpoint for subscriptions.
	/// * `request_timeout` - Upper bound for a single HTTP round trip.
	///
	/// # Errors
	/// Returns `RpcError::HttpError` if the HTTP client cannot be constructed.
	pub fn new(rpc_url: String, ws_url: String, request_timeout: Duration) -> Result<Self, RpcError> {
		let http_client = Client::builder().timeout(request_timeout).build()?;

		Ok(Self {
			http_client,
			rpc_url,
			ws_url,
			next_id: Arc::new(AtomicU64::new(1)),
		})
	}

	fn next_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Execute a JSON-RPC request.
	///
	/// # Arguments
	/// * `method` - The RPC method name.
	/// * `params` - Positional parameters for the method.
	///
	/// # Returns
	/// The `result` member of the response (`Value::Null` when the node returned null), or an
	/// `RpcError` if the request fails or the node answers with an error object.
	pub async fn request(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RpcError> {
		let request_body = JsonRpcRequest::new(self.next_id(), method, params);
		debug!("Sending {} to {}", method, self.rpc_url);

		let response = self
			.http_client
			.post(&self.rpc_url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(RpcError::Rpc {
				code: i64::from(response.status().as_u16()),
				message: format!("HTTP error: {}", response.status()),
			});
		}

		let response: JsonRpcResponse = response.json().await?;

		if let Some(error) = response.error {
			debug!("{} failed with code {}: {}", method, error.code, error.message);
			return Err(error.into());
		}

		Ok(response.result.unwrap_or(serde_json::Value::Null))
	}

	/// Execute a JSON-RPC request and deserialize its result.
	pub async fn request_as<T: DeserializeOwned>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<T, RpcError> {
		let result = self.request(method, params).await?;
		Ok(serde_json::from_value(result)?)
	}

	/// Subscribe to contract logs over WebSocket.
	///
	/// # Arguments
	/// * `filter` - Contract address and topics to match.
	///
	/// # Returns
	/// A pinned async stream of logs in node delivery order. Each item is either a log or an error.
	///
	/// # Errors
	/// Returns `RpcError` if the WebSocket connection or the `eth_subscribe` handshake fails.
	pub async fn open_log_subscription(&self, filter: &LogFilter) -> Result<LogStream, RpcError> {
		debug!("Attempting WebSocket connection to: {}", self.ws_url);

		let request = self.ws_url.clone().into_client_request()?;
		let (ws_stream, response) = connect_async(request).await?;
		debug!(
			"WebSocket connection established, response status: {}",
			response.status()
		);
		let (mut ws_sender, mut ws_receiver) = ws_stream.split();

		let request_id = self.next_id();
		let subscribe_message = JsonRpcRequest::new(request_id, "eth_subscribe", json!(["logs", filter]));
		ws_sender
			.send(Message::Text(serde_json::to_string(&subscribe_message)?))
			.await?;

		// Wait for the subscription id
		let subscription_id = loop {
			let Some(msg) = ws_receiver.next().await else {
				return Err(RpcError::SubscriptionError(
					"Connection closed before the subscription was acknowledged".to_string(),
				));
			};
			match msg? {
				Message::Text(text) => {
					let parsed: JsonRpcResponse = serde_json::from_str(&text)?;
					if parsed.id != Some(json!(request_id)) {
						debug!("Ignoring message during handshake: {}", text);
						continue;
					}
					if let Some(error) = parsed.error {
						return Err(error.into());
					}
					break parsed
						.result
						.as_ref()
						.and_then(|result| result.as_str())
						.map(str::to_string)
						.ok_or(RpcError::NoData)?;
				}
				Message::Ping(_) | Message::Pong(_) => continue,
				_ => {
					return Err(RpcError::SubscriptionError(
						"Unexpected message type during handshake".to_string(),
					));
				}
			}
		};

		info!("Log subscription {} established", subscription_id);

		// Return stream of logs
		let stream = ws_receiver.filter_map(move |msg| {
			let subscription_id = subscription_id.clone();
			async move {
				match msg {
					Ok(Message::Text(text)) => {
						let notification = match serde_json::from_str::<SubscriptionNotification>(&text) {
							Ok(notification) => notification,
							Err(_) => {
								debug!("Ignoring non-notification message: {}", text);
								return None;
							}
						};
						if notification.method != "eth_subscription"
							|| notification.params.subscription != subscription_id
						{
							debug!("Ignoring notification for {}", notification.params.subscription);
							return None;
						}
						match serde_json::from_value::<Log>(notification.params.result) {
							Ok(log) => Some(Ok(log)),
							Err(e) => {
								error!("Failed to deserialize log notification: {}", e);
								Some(Err(RpcError::JsonError(e)))
							}
						}
					}
					Ok(Message::Close(frame)) => {
						info!("Log subscription closed by node: {:?}", frame);
						Some(Err(RpcError::SubscriptionError(
							"Subscription closed by node".to_string(),
						)))
					}
					Ok(_) => None,
					Err(e) => Some(Err(RpcError::WebSocketError(e))),
				}
			}
		});

		Ok(Box::pin(stream))
	}
}

#[async_trait::async_trait]
impl LedgerTransport for JsonRpcClient {
	async fn call(&self, request: &CallRequest) -> Result<Bytes, RpcError> {
		self.request_as("eth_call", json!([request, "latest"])).await
	}

	async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcError> {
		self.request_as("eth_sendTransaction", json!([request])).await
	}

	async fn transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, RpcError> {
		self.request_as("eth_getTransactionReceipt", json!([hash]))
			.await
	}

	async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogStream, RpcError> {
		self.open_log_subscription(filter).await
	}
}

#[async_trait::async_trait]
impl WalletProvider for JsonRpcClient {
	async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
		self.request_as("eth_accounts", json!([])).await
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
		self.request_as("eth_requestAccounts", json!([])).await
	}
}
