use alloy_primitives::Address;

/// Connection state of the wallet session.
///
/// The connected account travels inside `Connected`, so an account exists exactly when the
/// session is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Disconnected,
	/// An authorization prompt is pending.
	Connecting,
	Connected(Address),
}

impl SessionState {
	pub fn status(&self) -> SessionStatus {
		match self {
			SessionState::Disconnected => SessionStatus::Disconnected,
			SessionState::Connecting => SessionStatus::Connecting,
			SessionState::Connected(_) => SessionStatus::Connected,
		}
	}

	pub fn account(&self) -> Option<Address> {
		match self {
			SessionState::Connected(account) => Some(*account),
			_ => None,
		}
	}
}

/// Session status without the account, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
	Disconnected,
	Connecting,
	Connected,
}
