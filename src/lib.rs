//! Column bridge: an AIP-62 wallet provider emulated inside an embedded webview.
//!
//! Page code sees an ordinary browser-extension wallet. Every operation is
//! forwarded as a string frame to the native host, which owns keys and
//! approval UI, and answered asynchronously.
//!
//! # Architecture
//!
//! ```text
//! Bridge (entry point)
//!   │
//!   ├── WalletProvider (features, legacy shims, connection state)
//!   │     ├── EventEmitter   change / accountChange / networkChange
//!   │     └── RpcClient
//!   │           ├── Registry   id → pending oneshot
//!   │           └── Transport  ReactNativeWebView.postMessage / MemoryTransport
//!   │
//!   ├── Discovery (wallet-standard announcement, window globals, legacy events)
//!   │     └── Page  DomPage (browser) / any test double
//!   │
//!   └── TaskQueue (inbound frames, timers, page handshakes → one consumer)
//! ```
//!
//! # Wire messages
//!
//! | Direction | `type` | Fields |
//! |-----------|--------|--------|
//! | page → host | `column:request` | `id, method, params, origin` |
//! | page → host | `column:log` | `message, data` |
//! | host → page | `column:response` | `id, result?, error?` |
//! | host → page | `column:event` | `event, data` |
//!
//! # Features
//!
//! - `native` - CLI, host-side tooling, terminal logging (default)
//! - `wasm` - the injected browser build (wasm-bindgen, DOM events)
//!
//! # Usage
//!
//! ```ignore
//! use column_bridge::{Bridge, BridgeConfig, MemoryTransport};
//!
//! let transport = MemoryTransport::new();
//! let (bridge, mut rx) = Bridge::new(&BridgeConfig::default(), Rc::new(transport.clone()), page, "https://dapp.example");
//! bridge.start();
//!
//! let pending = bridge.provider().connect(false, None);
//! // host answers: bridge.queue().push(Task::Inbound(raw)); bridge.drain(&mut rx);
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod bridge;
pub mod config;
pub mod core;
pub mod discovery;
pub mod error;
pub mod events;
pub mod provider;
pub mod queue;
pub mod rpc;
pub mod transport;

// =============================================================================
// Native-only modules (CLI, terminal logging)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use bridge::Bridge;
pub use config::{BridgeConfig, WalletInfo};
pub use core::codec::{InboundMessage, OutboundMessage};
pub use core::registry::{PendingCall, Registry};
pub use discovery::{Discovery, HandshakePayload, MemoryPage, Page, Phase};
pub use error::{BridgeError, BridgeResult, HostError, HostStatus, PageError};
pub use events::{listener, Disposer, EventEmitter, Listener};
pub use provider::{Account, ConnectionState, Features, Network, Operation, UserResponse, WalletProvider};
pub use queue::{Task, TaskQueue, TaskReceiver};
pub use rpc::RpcClient;
pub use transport::{MemoryTransport, Transport};

#[cfg(feature = "native")]
pub use logging::{init_logging, LogFormat};

#[cfg(feature = "wasm")]
pub use wasm::{install, DomPage, WebViewTransport};
