//! Local mirror of the contract state read by the presentation layer.
//!
//! Holds the append-only wave log and the remote wave counter. The two fields are updated
//! independently: `total_count` always comes from the contract while `records` may lag
//! behind or run ahead of it, so `records.len()` and `total_count` are allowed to disagree.

use crate::contract::ContractRecord;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::debug;

/// Point-in-time copy of the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSnapshot {
	pub records: Vec<ContractRecord>,
	pub total_count: u64,
}

pub struct MirrorStore {
	state: RwLock<MirrorSnapshot>,
	/// Bumped after every mutation.
	revision: watch::Sender<u64>,
}

impl MirrorStore {
	pub fn new() -> Self {
		let (revision, _) = watch::channel(0);
		Self {
			state: RwLock::new(MirrorSnapshot::default()),
			revision,
		}
	}

	/// Replace the whole log, typically with a fresh `read_all` result.
	pub fn replace_all(&self, records: Vec<ContractRecord>) {
		let len = records.len();
		self.write().records = records;
		debug!("Mirror replaced with {} records", len);
		self.bump();
	}

	/// Add one record at the end of the log.
	pub fn append(&self, record: ContractRecord) {
		self.write().records.push(record);
		self.bump();
	}

	pub fn set_total_count(&self, total_count: u64) {
		self.write().total_count = total_count;
		self.bump();
	}

	pub fn snapshot(&self) -> MirrorSnapshot {
		self.read().clone()
	}

	pub fn records(&self) -> Vec<ContractRecord> {
		self.read().records.clone()
	}

	pub fn len(&self) -> usize {
		self.read().records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().records.is_empty()
	}

	pub fn total_count(&self) -> u64 {
		self.read().total_count
	}

	/// Number of mutations applied so far.
	pub fn revision(&self) -> u64 {
		*self.revision.borrow()
	}

	/// Follow mutations. The receiver yields the revision after each completed change.
	pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	fn bump(&self) {
		self.revision.send_modify(|revision| *revision += 1);
	}

	// Mutations never leave the state half-written, so a poisoned lock is still consistent.
	fn read(&self) -> RwLockReadGuard<'_, MirrorSnapshot> {
		self.state.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, MirrorSnapshot> {
		self.state.write().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for MirrorStore {
	fn default() -> Self {
		Self::new()
	}
}
