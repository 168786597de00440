//! WalletProvider: the emulated AIP-62 wallet
//!
//! One instance per page. Every feature, legacy shim and inbound event
//! goes through the methods here, so connection state has a single owner.
//! Approval flows resolve to `UserResponse`; a user decline is
//! `Rejected`, never an error.

use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

use super::features::{Features, Operation};
use super::types::{Account, ConnectionState, Network, UserResponse};
use crate::config::{BridgeConfig, WalletInfo};
use crate::core::names::{event, method};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{Disposer, EventEmitter, Listener};
use crate::rpc::RpcClient;

struct ProviderInner {
    rpc: RpcClient,
    emitter: EventEmitter,
    state: RefCell<ConnectionState>,
    info: WalletInfo,
    features: Features,
    default_network: Network,
}

/// Cheap to clone; clones share state
#[derive(Clone)]
pub struct WalletProvider {
    inner: Rc<ProviderInner>,
}

impl WalletProvider {
    pub fn new(rpc: RpcClient, config: &BridgeConfig) -> Self {
        Self::with_features(rpc, config, Features::standard())
    }

    pub fn with_features(rpc: RpcClient, config: &BridgeConfig, features: Features) -> Self {
        Self {
            inner: Rc::new(ProviderInner {
                rpc,
                emitter: EventEmitter::new(),
                state: RefCell::new(ConnectionState::disconnected()),
                info: config.wallet.clone(),
                features,
                default_network: config.default_network.clone(),
            }),
        }
    }

    pub fn info(&self) -> &WalletInfo {
        &self.inner.info
    }

    pub fn features(&self) -> &Features {
        &self.inner.features
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.inner.rpc
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.inner.emitter
    }

    /// Snapshot of the connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    /// Snapshot of the connected accounts
    pub fn accounts(&self) -> Vec<Account> {
        self.inner.state.borrow().accounts.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().connected
    }

    fn replace_state(&self, next: ConnectionState) {
        *self.inner.state.borrow_mut() = next;
    }

    fn emit_change(&self) {
        let payload = json!({ "accounts": self.state().accounts_value() });
        self.inner.emitter.emit(event::CHANGE, &payload);
    }

    // =========================================================================
    // APPROVAL FLOWS
    // =========================================================================

    pub async fn connect(&self, silent: bool, network_hint: Option<Value>) -> BridgeResult<UserResponse<Account>> {
        let params = json!({ "silent": silent, "networkInfo": network_hint });
        match self.inner.rpc.call(method::CONNECT, params).await {
            Ok(result) => match parse_account(method::CONNECT, &result)? {
                Some(account) => {
                    tracing::info!(address = %account.address, "connected");
                    self.replace_state(ConnectionState::connected(account.clone()));
                    self.emit_change();
                    Ok(UserResponse::Approved(account))
                }
                None => Ok(UserResponse::Rejected),
            },
            Err(e) if e.is_rejection() => Ok(UserResponse::Rejected),
            Err(e) => Err(e),
        }
    }

    /// Always succeeds locally, whatever the host answers
    pub async fn disconnect(&self) {
        if let Err(e) = self.inner.rpc.call(method::DISCONNECT, json!({})).await {
            tracing::warn!(error = %e, "host disconnect failed, clearing local state anyway");
        }
        self.replace_state(ConnectionState::disconnected());
        self.emit_change();
    }

    pub async fn sign_message(&self, input: Value) -> BridgeResult<UserResponse<Value>> {
        let outcome = self.inner.rpc.call(method::SIGN_MESSAGE, input).await;
        approve_non_null(outcome)
    }

    /// Accepts a bare payload or `{ payload, .. }`
    pub async fn sign_transaction(&self, transaction: Value, as_fee_payer: Option<bool>) -> BridgeResult<UserResponse<Value>> {
        let params = json!({
            "payload": unwrap_payload(transaction),
            "asFeePayer": as_fee_payer.unwrap_or(false),
        });
        let outcome = self.inner.rpc.call(method::SIGN_TRANSACTION, params).await;
        approve_non_null(outcome)
    }

    /// Approved only when the host returns a transaction hash
    pub async fn sign_and_submit_transaction(&self, input: Value) -> BridgeResult<UserResponse<Value>> {
        match self.inner.rpc.call(method::SIGN_AND_SUBMIT, input).await {
            Ok(result) => {
                let has_hash = result
                    .get("hash")
                    .and_then(Value::as_str)
                    .is_some_and(|hash| !hash.is_empty());
                Ok(if has_hash { UserResponse::Approved(result) } else { UserResponse::Rejected })
            }
            Err(e) if e.is_rejection() => Ok(UserResponse::Rejected),
            Err(e) => Err(e),
        }
    }

    /// Local stub: no host round trip
    pub fn change_network(&self, network: Value) -> UserResponse<Value> {
        tracing::debug!(%network, "changeNetwork is not forwarded to the host");
        UserResponse::Approved(network)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Cached account, else one round trip (cached on success)
    pub async fn get_account(&self) -> BridgeResult<Option<Account>> {
        let cached = self.inner.state.borrow().account().cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        let result = self.inner.rpc.call(method::ACCOUNT, json!({})).await?;
        let account = parse_account(method::ACCOUNT, &result)?;
        if let Some(account) = &account {
            self.replace_state(ConnectionState::connected(account.clone()));
        }
        Ok(account)
    }

    /// Never fails: falls back to the configured default network
    pub async fn get_network(&self) -> Network {
        match self.inner.rpc.call(method::GET_NETWORK, json!({})).await {
            Ok(result) => Network::from_host(&result).unwrap_or_else(|| self.inner.default_network.clone()),
            Err(e) => {
                tracing::debug!(error = %e, "getNetwork failed, using default");
                self.inner.default_network.clone()
            }
        }
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// AIP-62 `onAccountChange`: no disposer
    pub fn on_account_change(&self, listener: Listener) {
        self.inner.emitter.subscribe_legacy(event::ACCOUNT_CHANGE, listener);
    }

    /// AIP-62 `onNetworkChange`: no disposer
    pub fn on_network_change(&self, listener: Listener) {
        self.inner.emitter.subscribe_legacy(event::NETWORK_CHANGE, listener);
    }

    /// `standard:events.on`: returns a disposer
    pub fn on(&self, event_name: &str, listener: Listener) -> Disposer {
        self.inner.emitter.subscribe(event_name, listener)
    }

    /// Apply a host-pushed `column:event`, then fan it out
    pub fn apply_event(&self, event_name: &str, data: &Value) {
        match event_name {
            event::ACCOUNT_CHANGE => {
                let next = match Account::from_host(data) {
                    Some(account) => ConnectionState::connected(account),
                    None => ConnectionState::disconnected(),
                };
                self.replace_state(next);
            }
            event::CHANGE => {
                if let Some(accounts) = data.get("accounts").and_then(Value::as_array) {
                    let next = match accounts.iter().find_map(Account::from_host) {
                        Some(account) => ConnectionState::connected(account),
                        None => ConnectionState::disconnected(),
                    };
                    self.replace_state(next);
                }
            }
            _ => {}
        }
        let delivered = self.inner.emitter.emit(event_name, data);
        tracing::debug!(event = event_name, delivered, "host event");
    }

    /// Send a diagnostic to the host
    pub fn log(&self, message: &str, data: Value) {
        self.inner.rpc.log(message, data);
    }

    // =========================================================================
    // GENERIC DISPATCH (feature map → operation)
    // =========================================================================

    /// Run a value-returning operation with page-supplied arguments.
    /// Subscription operations take callbacks and are rejected here.
    pub async fn invoke(&self, op: Operation, args: &[Value]) -> BridgeResult<Value> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
        let flag = |i: usize| args.get(i).and_then(Value::as_bool);

        Ok(match op {
            Operation::Connect => {
                let hint = args.get(1).filter(|v| !v.is_null()).cloned();
                self.connect(flag(0).unwrap_or(false), hint).await?.map(|a| a.to_value()).to_value()
            }
            Operation::Disconnect => {
                self.disconnect().await;
                Value::Null
            }
            Operation::Account => self.get_account().await?.map_or(Value::Null, |a| a.to_value()),
            Operation::Network => serde_json::to_value(self.get_network().await)
                .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?,
            Operation::SignMessage => self.sign_message(arg(0)).await?.to_value(),
            Operation::SignTransaction => self.sign_transaction(arg(0), flag(1)).await?.to_value(),
            Operation::SignAndSubmitTransaction => self.sign_and_submit_transaction(arg(0)).await?.to_value(),
            Operation::ChangeNetwork => self.change_network(arg(0)).to_value(),
            Operation::OnAccountChange | Operation::OnNetworkChange | Operation::On => {
                return Err(BridgeError::InvalidArgument(format!("{} takes a callback", op.js_name())));
            }
        })
    }
}

/// `{ payload: X, .. }` → X; anything else is already the payload
pub fn unwrap_payload(transaction: Value) -> Value {
    match transaction {
        Value::Object(mut map) if map.contains_key("payload") => map.remove("payload").unwrap_or(Value::Null),
        other => other,
    }
}

/// Host answered with something that looks like an account but isn't one
fn parse_account(method_name: &str, result: &Value) -> BridgeResult<Option<Account>> {
    Account::parse_host(result).map_err(|e| BridgeError::InvalidResponse(format!("{}: malformed account: {}", method_name, e)))
}

fn approve_non_null(outcome: BridgeResult<Value>) -> BridgeResult<UserResponse<Value>> {
    match outcome {
        Ok(Value::Null) => Ok(UserResponse::Rejected),
        Ok(result) => Ok(UserResponse::Approved(result)),
        Err(e) if e.is_rejection() => Ok(UserResponse::Rejected),
        Err(e) => Err(e),
    }
}
