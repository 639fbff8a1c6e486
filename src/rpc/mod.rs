//! JSON-RPC integration module for the ledger node
//!
//! This module provides the client and wire types for talking to an Ethereum-compatible node
//! and the wallet that signs on the bridge's behalf. Calls and transactions travel over HTTP,
//! event subscriptions over WebSocket.

/// JSON-RPC client for calls, transactions and log subscriptions
mod client;
/// Wire types and transport errors
mod types;

pub use client::JsonRpcClient;
pub use types::*;
