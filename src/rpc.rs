//! RPC client: (method, params) → correlated host response
//!
//! Fire-once per call. The request is registered and sent when `call`
//! runs, before the returned future is polled; a send failure rejects the
//! entry on the spot so nothing is left pending. Host error strings are
//! typed here (`HostError::parse`) before they reach callers.

use serde_json::Value;
use std::rc::Rc;

use crate::core::codec::{self, OutboundMessage};
use crate::core::registry::{PendingCall, Registry};
use crate::error::{BridgeError, HostError};
use crate::transport::Transport;

#[derive(Clone)]
pub struct RpcClient {
    transport: Rc<dyn Transport>,
    registry: Registry,
    origin: Rc<str>,
}

impl RpcClient {
    pub fn new(transport: Rc<dyn Transport>, origin: &str) -> Self {
        Self { transport, registry: Registry::new(), origin: Rc::from(origin) }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn call(&self, method: &str, params: Value) -> PendingCall {
        let (id, pending) = self.registry.register();
        let raw = codec::encode(&OutboundMessage::request(id, method, params, &*self.origin));
        tracing::debug!(id, method, "rpc request");

        if let Err(e) = self.transport.send(&raw) {
            tracing::warn!(id, method, error = %e, "send failed, rejecting");
            self.registry.reject(id, BridgeError::from(e));
        }
        pending
    }

    /// Apply a `column:response` to the matching pending call
    pub fn settle(&self, id: u64, result: Value, error: Option<Value>) -> bool {
        match error {
            Some(error) => {
                let error = HostError::parse(&codec::error_text(&error));
                tracing::debug!(id, status = error.status.as_str(), "rpc error response");
                self.registry.reject(id, BridgeError::Host(error))
            }
            None => {
                tracing::debug!(id, "rpc response");
                self.registry.resolve(id, result)
            }
        }
    }

    /// Send a `column:log` diagnostic; failures are swallowed
    pub fn log(&self, message: &str, data: Value) {
        let raw = codec::encode(&OutboundMessage::log(message, data));
        if let Err(e) = self.transport.send(&raw) {
            tracing::debug!(error = %e, "diagnostic not delivered");
        }
    }
}
