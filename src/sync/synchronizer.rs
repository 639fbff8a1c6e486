//! Contract event subscription feeding the local mirror.
//!
//! `EventSynchronizer` opens a log subscription on its `LedgerConnection` and runs a delivery
//! task that decodes each new event occurrence, hands it to the registered handler and then
//! refreshes the mirrored wave counter. Records already fetched through `read_all` are not
//! reconciled against delivered events; the mirror tolerates that overlap.

use super::delivery_tracker::{Admission, DeliveryTracker};
use super::events::{WaveEventHandler, decode_new_wave, event_topic};
use crate::connection::{LedgerConnection, LogStream};
use crate::contract::ContractGateway;
use crate::error::BridgeError;
use crate::mirror::MirrorStore;
use crate::rpc::LogFilter;

use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Public view of one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscription {
	pub event_name: String,
	pub active: bool,
}

/// Shared between the owner and the delivery task. Handler calls happen only while holding
/// it with the flag set; clearing the flag under the lock ends delivery.
type DeliveryGate = Arc<Mutex<bool>>;

struct ActiveSubscription {
	gate: DeliveryGate,
	task: JoinHandle<()>,
}

impl ActiveSubscription {
	fn is_active(&self) -> bool {
		*lock(&self.gate) && !self.task.is_finished()
	}
}

pub struct EventSynchronizer {
	connection: LedgerConnection,
	gateway: ContractGateway,
	store: Arc<MirrorStore>,
	subscriptions: HashMap<String, ActiveSubscription>,
}

impl EventSynchronizer {
	pub fn new(connection: LedgerConnection, gateway: ContractGateway, store: Arc<MirrorStore>) -> Self {
		Self {
			connection,
			gateway,
			store,
			subscriptions: HashMap::new(),
		}
	}

	pub fn connection(&self) -> &LedgerConnection {
		&self.connection
	}

	pub fn is_subscribed(&self) -> bool {
		self.subscriptions.values().any(ActiveSubscription::is_active)
	}

	pub fn subscriptions(&self) -> Vec<EventSubscription> {
		self.subscriptions
			.iter()
			.map(|(event_name, subscription)| EventSubscription {
				event_name: event_name.clone(),
				active: subscription.is_active(),
			})
			.collect()
	}

	/// Start delivering `event_name` occurrences to `handler`.
	///
	/// # Errors
	/// `DuplicateSubscription` if this connection already has a live subscription for the
	/// event, `UnknownEvent` for events the contract does not declare, `SubscriptionFailure`
	/// if the node refuses the subscription.
	pub async fn subscribe(
		&mut self,
		event_name: &str,
		handler: Arc<dyn WaveEventHandler>,
	) -> Result<(), BridgeError> {
		if self
			.subscriptions
			.get(event_name)
			.is_some_and(ActiveSubscription::is_active)
		{
			return Err(BridgeError::DuplicateSubscription(event_name.to_string()));
		}

		let topic = event_topic(event_name)?;
		let filter = LogFilter {
			address: self.gateway.address(),
			topics: vec![topic],
		};

		let stream = self
			.connection
			.provider()
			.subscribe_logs(&filter)
			.await
			.map_err(|e| BridgeError::SubscriptionFailure(e.to_string()))?;

		let gate: DeliveryGate = Arc::new(Mutex::new(true));
		let task = tokio::spawn(deliver(
			event_name.to_string(),
			stream,
			gate.clone(),
			handler,
			self.gateway.clone(),
			self.store.clone(),
		));

		info!(
			"Subscribed to {} on {} for {}",
			event_name,
			self.gateway.address(),
			self.connection.signer()
		);
		self.subscriptions
			.insert(event_name.to_string(), ActiveSubscription { gate, task });
		Ok(())
	}

	/// Stop all deliveries. Safe to call any number of times.
	///
	/// Once this returns no handler call is running or will run. Must not be called from
	/// inside a handler.
	pub fn unsubscribe(&mut self) {
		for (event_name, subscription) in self.subscriptions.drain() {
			*lock(&subscription.gate) = false;
			subscription.task.abort();
			info!("Unsubscribed from {}", event_name);
		}
	}
}

impl Drop for EventSynchronizer {
	fn drop(&mut self) {
		self.unsubscribe();
	}
}

fn lock(gate: &DeliveryGate) -> MutexGuard<'_, bool> {
	gate.lock().unwrap_or_else(PoisonError::into_inner)
}

fn report(gate: &DeliveryGate, handler: &Arc<dyn WaveEventHandler>, error: BridgeError) {
	let active = lock(gate);
	if *active {
		handler.on_error(error);
	}
}

async fn deliver(
	event_name: String,
	mut stream: LogStream,
	gate: DeliveryGate,
	handler: Arc<dyn WaveEventHandler>,
	gateway: ContractGateway,
	store: Arc<MirrorStore>,
) {
	let mut tracker = DeliveryTracker::new();

	while let Some(item) = stream.next().await {
		let log = match item {
			Ok(log) => log,
			Err(e) => {
				error!("Error in {} subscription: {}", event_name, e);
				tracker.record_failure();
				report(&gate, &handler, BridgeError::SubscriptionFailure(e.to_string()));
				continue;
			}
		};

		match tracker.admit(&log) {
			Admission::Deliver => {}
			Admission::Duplicate => {
				debug!("Skipping repeated {} log {:?}", event_name, log.occurrence());
				continue;
			}
			Admission::Removed => {
				warn!("Skipping removed {} log {:?}", event_name, log.occurrence());
				continue;
			}
		}

		let record = match decode_new_wave(&log) {
			Ok(record) => record,
			Err(e) => {
				tracker.record_failure();
				report(&gate, &handler, e);
				continue;
			}
		};

		debug!("{} from {}: {:?}", event_name, record.sender, record.message);
		{
			let active = lock(&gate);
			if !*active {
				break;
			}
			handler.on_record(record);
		}
		tracker.record_delivered(&log);

		match gateway.read_total_count().await {
			Ok(total_count) => {
				let active = lock(&gate);
				if !*active {
					break;
				}
				store.set_total_count(total_count);
			}
			Err(e) => {
				warn!("Failed to refresh wave count after {}: {}", event_name, e);
				report(&gate, &handler, e);
			}
		}

		tracker.log_progress(false);
	}

	info!(
		"{} delivery ended: {}",
		event_name,
		tracker.stats().summary()
	);
}
