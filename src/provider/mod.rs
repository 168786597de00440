//! Wallet capability object
//!
//! ```text
//! WalletProvider
//!   ├── Features        "aptos:connect" → { version, [Connect] }, ...
//!   ├── ConnectionState { connected, accounts[0..=1] }
//!   ├── EventEmitter    change / accountChange / networkChange
//!   └── RpcClient       → host
//! ```

mod features;
mod legacy;
mod types;
mod wallet;

pub use features::{FeatureDescriptor, Features, Operation};
pub use types::{Account, ConnectionState, Network, UserResponse};
pub use wallet::{unwrap_payload, WalletProvider};
