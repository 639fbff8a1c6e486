//! Bridge between a wallet-backed account and the WavePortal contract.
//!
//! The crate keeps a local mirror of the contract's wave log, follows `NewWave` events as
//! they are mined and submits new waves on behalf of the connected account.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod contract;
pub mod error;
pub mod mirror;
pub mod rpc;
pub mod sync;
pub mod utils;
pub mod wallet;

pub use bridge::WaveBridge;
pub use config::BridgeConfig;
pub use connection::{LedgerConnection, LedgerTransport, LogStream};
pub use contract::{Confirmation, ContractGateway, ContractRecord, TransactionHandle};
pub use error::BridgeError;
pub use mirror::{MirrorSnapshot, MirrorStore};
pub use sync::{EventSynchronizer, WaveEventHandler};
pub use wallet::{SessionState, SessionStatus, WalletCapability, WalletProvider, WalletSession};
