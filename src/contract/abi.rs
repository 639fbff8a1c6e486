//! Bindings for the WavePortal contract.

use alloy_sol_types::sol;

/// Name of the event emitted once per successful `wave`.
pub const NEW_WAVE_EVENT: &str = "NewWave";

sol! {
	#[derive(Debug, PartialEq, Eq)]
	contract WavePortal {
		struct Wave {
			address waver;
			string message;
			uint256 timestamp;
		}

		event NewWave(address indexed from, uint256 timestamp, string message);

		function wave(string memory _message) public;

		function getAllWaves() public view returns (Wave[] memory);

		function getTotalWaves() public view returns (uint256);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_sol_types::{SolCall, SolEvent};

	#[test]
	fn event_name_matches_abi() {
		assert_eq!(
			WavePortal::NewWave::SIGNATURE,
			format!("{NEW_WAVE_EVENT}(address,uint256,string)")
		);
	}

	#[test]
	fn wave_calldata_carries_message_verbatim() {
		let calldata = WavePortal::waveCall {
			_message: String::new(),
		}
		.abi_encode();
		assert_eq!(&calldata[..4], WavePortal::waveCall::SELECTOR.as_slice());

		let decoded = WavePortal::waveCall::abi_decode(&calldata, true).unwrap();
		assert_eq!(decoded._message, "");
	}
}
