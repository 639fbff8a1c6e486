use std::time::Duration;
use tracing::{error, info, warn};

use wave_bridge::{BridgeConfig, BridgeError, WaveBridge};

/// Optional message to wave once connected.
const MESSAGE_VAR: &str = "WAVE_BRIDGE_MESSAGE";

/// Stop following the mirror after this long without changes.
const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Give up waiting for the wave to be mined after this long.
const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive("wave_bridge=debug".parse().unwrap())
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting wave bridge");

	let config = match BridgeConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return;
		}
	};
	info!(
		"Using node {} and contract {}",
		config.rpc_url, config.contract_address
	);

	let mut bridge = WaveBridge::from_config(&config).unwrap();

	let account = match bridge.start().await {
		Ok(account) => account,
		Err(BridgeError::NoWalletCapability) => {
			warn!("No wallet available, nothing to follow");
			return;
		}
		Err(e) => {
			error!("Failed to start bridge: {}", e);
			return;
		}
	};

	let snapshot = bridge.store().snapshot();
	info!(
		"Mirror loaded with {} waves (contract reports {})",
		snapshot.records.len(),
		snapshot.total_count
	);

	if let Ok(message) = std::env::var(MESSAGE_VAR) {
		if account.is_none() {
			if let Err(e) = bridge.connect().await {
				error!("Failed to connect wallet: {}", e);
				return;
			}
		}

		match bridge
			.wave_and_confirm(message, Some(CONFIRMATION_TIMEOUT))
			.await
		{
			Ok(confirmation) if confirmation.is_confirmed() => {}
			Ok(confirmation) => warn!(
				"Wave was mined but failed: {:?}",
				confirmation.receipt().transaction_hash
			),
			Err(e) => error!("Failed to wave: {}", e),
		}
	}

	let mut changes = bridge.store().subscribe_changes();
	let mut failures = bridge.failures();
	let mut seen = bridge.store().len();

	loop {
		tokio::select! {
			changed = tokio::time::timeout(IDLE_TIMEOUT, changes.changed()) => {
				match changed {
					Ok(Ok(())) => {
						changes.borrow_and_update();
						let snapshot = bridge.store().snapshot();
						for record in snapshot.records.iter().skip(seen) {
							info!(
								"[{}] {} waved: {}",
								record.timestamp.to_rfc3339(),
								record.sender,
								record.message
							);
						}
						seen = snapshot.records.len();
						info!("Total waves: {}", snapshot.total_count);
					}
					Ok(Err(_)) => break,
					Err(_) => {
						info!("No activity for {:?}, stopping", IDLE_TIMEOUT);
						break;
					}
				}
			}
			failure = failures.recv() => {
				match failure {
					Ok(e) => error!("Event delivery failed: {}", e),
					Err(e) => warn!("Failure channel: {}", e),
				}
			}
		}
	}

	bridge.shutdown();
	info!("Wave bridge stopped");
}
