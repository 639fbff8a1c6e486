//! WavePortal contract access.
//!
//! Holds the ABI bindings, the gateway for typed reads and writes, and the record and
//! transaction types the rest of the bridge works with.

/// Solidity bindings for the WavePortal contract
pub mod abi;
/// Typed read/write gateway
pub mod gateway;
/// Records, transaction handles and gateway configuration
pub mod types;

pub use abi::{NEW_WAVE_EVENT, WavePortal};
pub use gateway::ContractGateway;
pub use types::*;
