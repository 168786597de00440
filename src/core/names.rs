//! Wire and page-facing name constants
//!
//! Centralized registry for message tags, RPC methods, event names and
//! feature keys so the provider, bridge and browser bindings agree.

/// `type` tags of the transport envelope
pub mod message {
    pub const REQUEST: &str = "column:request";
    pub const LOG: &str = "column:log";
    pub const RESPONSE: &str = "column:response";
    pub const EVENT: &str = "column:event";
}

/// RPC methods understood by the host
pub mod method {
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const ACCOUNT: &str = "account";
    pub const GET_NETWORK: &str = "getNetwork";
    pub const SIGN_MESSAGE: &str = "signMessage";
    pub const SIGN_TRANSACTION: &str = "signTransaction";
    pub const SIGN_AND_SUBMIT: &str = "signAndSubmitTransaction";

    pub const ALL: &[&str] = &[
        CONNECT, DISCONNECT, ACCOUNT, GET_NETWORK, SIGN_MESSAGE, SIGN_TRANSACTION, SIGN_AND_SUBMIT,
    ];
}

/// Internal event names (also the names the host pushes)
pub mod event {
    /// Fired by connect/disconnect with the new accounts
    pub const CHANGE: &str = "change";
    pub const ACCOUNT_CHANGE: &str = "accountChange";
    pub const NETWORK_CHANGE: &str = "networkChange";
}

/// Namespaced feature keys on the wallet object
pub mod feature {
    pub const CONNECT: &str = "aptos:connect";
    pub const DISCONNECT: &str = "aptos:disconnect";
    pub const ACCOUNT: &str = "aptos:account";
    pub const NETWORK: &str = "aptos:network";
    pub const ON_ACCOUNT_CHANGE: &str = "aptos:onAccountChange";
    pub const ON_NETWORK_CHANGE: &str = "aptos:onNetworkChange";
    pub const SIGN_MESSAGE: &str = "aptos:signMessage";
    pub const SIGN_TRANSACTION: &str = "aptos:signTransaction";
    pub const SIGN_AND_SUBMIT: &str = "aptos:signAndSubmitTransaction";
    pub const CHANGE_NETWORK: &str = "aptos:changeNetwork";
    pub const EVENTS: &str = "standard:events";

    pub const VERSION: &str = "1.0.0";
}

/// Discovery handshake events
pub mod discovery {
    /// Wallet → page announcement (wallet-standard)
    pub const REGISTER_WALLET: &str = "wallet-standard:register-wallet";
    /// Page → wallets "ready" signal (wallet-standard)
    pub const APP_READY: &str = "wallet-standard:app-ready";

    pub const LEGACY_INITIALIZED: &[&str] = &["aptos#initialized", "column#initialized"];
    pub const GLOBAL_NAMES: &[&str] = &["column", "aptos", "petra"];
    pub const IDENTITY_FLAGS: &[&str] = &["isColumn", "isPetra", "isAptos"];

    /// Re-announce delays (ms) after the immediate dispatch
    pub const ANNOUNCE_DELAYS_MS: &[u32] = &[0, 100, 500, 1500];
}
