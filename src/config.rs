//! Bridge configuration.
//!
//! Defaults target a local development node and the deployed WavePortal contract. Every value
//! can be overridden from the environment with `BridgeConfig::from_env`.

use crate::contract::{ConfirmationConfig, DEFAULT_GAS_LIMIT, GatewayConfig};

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Address the WavePortal contract is deployed at.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("bbb8a4642a335388a5390de5c25edbba801346fd");

pub const RPC_URL_VAR: &str = "WAVE_BRIDGE_RPC_URL";
pub const WS_URL_VAR: &str = "WAVE_BRIDGE_WS_URL";
pub const CONTRACT_VAR: &str = "WAVE_BRIDGE_CONTRACT";
pub const GAS_LIMIT_VAR: &str = "WAVE_BRIDGE_GAS_LIMIT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value {value:?} for {var}: {reason}")]
	InvalidValue {
		var: &'static str,
		value: String,
		reason: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
	/// HTTP JSON-RPC endpoint for calls and transactions.
	pub rpc_url: String,
	/// WebSocket JSON-RPC endpoint for event subscriptions.
	pub ws_url: String,
	pub contract_address: Address,
	/// Gas ceiling attached to every `wave` call.
	pub gas_limit: u64,
	/// Upper bound for a single HTTP round trip.
	pub request_timeout: Duration,
	pub confirmation: ConfirmationConfig,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			rpc_url: "http://127.0.0.1:8545".to_string(),
			ws_url: "ws://127.0.0.1:8545".to_string(),
			contract_address: DEFAULT_CONTRACT_ADDRESS,
			gas_limit: DEFAULT_GAS_LIMIT,
			request_timeout: Duration::from_secs(30),
			confirmation: ConfirmationConfig::default(),
		}
	}
}

impl BridgeConfig {
	/// Build a config from the process environment, falling back to defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	/// Build a config from an arbitrary variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let mut config = Self::default();

		if let Some(rpc_url) = lookup(RPC_URL_VAR) {
			config.rpc_url = rpc_url;
		}
		if let Some(ws_url) = lookup(WS_URL_VAR) {
			config.ws_url = ws_url;
		}
		if let Some(value) = lookup(CONTRACT_VAR) {
			config.contract_address =
				value
					.parse::<Address>()
					.map_err(|e| ConfigError::InvalidValue {
						var: CONTRACT_VAR,
						value: value.clone(),
						reason: e.to_string(),
					})?;
		}
		if let Some(value) = lookup(GAS_LIMIT_VAR) {
			config.gas_limit = match value.parse::<u64>() {
				Ok(0) => {
					return Err(ConfigError::InvalidValue {
						var: GAS_LIMIT_VAR,
						value,
						reason: "gas limit must be positive".to_string(),
					});
				}
				Ok(gas_limit) => gas_limit,
				Err(e) => {
					return Err(ConfigError::InvalidValue {
						var: GAS_LIMIT_VAR,
						value,
						reason: e.to_string(),
					});
				}
			};
		}

		Ok(config)
	}

	/// Gateway settings derived from this config.
	pub fn gateway(&self) -> GatewayConfig {
		GatewayConfig::new(self.contract_address)
			.with_gas_limit(self.gas_limit)
			.with_confirmation(self.confirmation.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |var: &str| vars.get(var).cloned()
	}

	#[test]
	fn defaults_apply_without_overrides() {
		let config = BridgeConfig::from_lookup(lookup(&[])).unwrap();
		assert_eq!(config, BridgeConfig::default());
		assert_eq!(config.gateway().gas_limit, 300_000);
	}

	#[test]
	fn overrides_are_read() {
		let config = BridgeConfig::from_lookup(lookup(&[
			(RPC_URL_VAR, "http://node:8545"),
			(CONTRACT_VAR, "0x00000000000000000000000000000000000000aa"),
			(GAS_LIMIT_VAR, "500000"),
		]))
		.unwrap();

		assert_eq!(config.rpc_url, "http://node:8545");
		assert_eq!(config.ws_url, "ws://127.0.0.1:8545");
		assert_eq!(config.contract_address, Address::with_last_byte(0xaa));
		assert_eq!(config.gateway().gas_limit, 500_000);
	}

	#[test]
	fn rejects_bad_values() {
		assert!(BridgeConfig::from_lookup(lookup(&[(GAS_LIMIT_VAR, "0")])).is_err());
		assert!(BridgeConfig::from_lookup(lookup(&[(GAS_LIMIT_VAR, "lots")])).is_err());
		assert!(BridgeConfig::from_lookup(lookup(&[(CONTRACT_VAR, "0x12")])).is_err());
	}
}
