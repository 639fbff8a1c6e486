use alloy_primitives::U256;
use chrono::{DateTime, Utc};

/// Convert a ledger timestamp (seconds since the Unix epoch) into a UTC instant.
///
/// Returns `None` when the value does not fit chrono's representable range.
pub fn epoch_seconds_to_datetime(seconds: U256) -> Option<DateTime<Utc>> {
	let seconds = i64::try_from(u64::try_from(seconds).ok()?).ok()?;
	DateTime::<Utc>::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn converts_epoch_seconds() {
		let instant = epoch_seconds_to_datetime(U256::from(1_700_000_000u64)).unwrap();
		assert_eq!(instant.to_rfc3339(), "2023-11-14T22:13:20+00:00");
	}

	#[test]
	fn rejects_out_of_range_timestamps() {
		assert_eq!(epoch_seconds_to_datetime(U256::MAX), None);
		assert_eq!(epoch_seconds_to_datetime(U256::from(u64::MAX)), None);
	}
}
