pub mod provider;
pub mod session;
pub mod types;

pub use provider::{WalletCapability, WalletProvider};
pub use session::WalletSession;
pub use types::*;
