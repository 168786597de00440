//! Integration Tests: page-side bridge against an in-memory host
//!
//! These tests verify:
//! 1. Connection state and the account cache
//! 2. Approval outcomes (approved, rejected, error) for every flow
//! 3. Out-of-order responses and transport failure
//! 4. Event fan-out, listener isolation and disposers
//! 5. Discovery idempotence, failure isolation and page handshakes
//! 6. Legacy shims

use column_bridge::core::codec::{self, InboundMessage, OutboundMessage};
use column_bridge::discovery::MemoryPage;
use column_bridge::{
    listener, Bridge, BridgeConfig, BridgeError, HandshakePayload, HostStatus, MemoryTransport, Operation, PageError, Phase, Task,
    TaskReceiver, UserResponse, WalletProvider,
};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

const ORIGIN: &str = "https://dapp.example";
const ADDRESS: &str = "0x8f3a1c0b7e2d4a5f9c6e1b0a3d2f4e5c6b7a8d9e0f1a2b3c4d5e6f708192a3b4";

fn account_json() -> Value {
    json!({ "address": ADDRESS, "publicKey": "0x0102ab" })
}

struct Harness {
    bridge: Bridge<MemoryPage>,
    rx: TaskReceiver,
    transport: MemoryTransport,
    page: MemoryPage,
    pool: LocalPool,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    fn with_config(config: BridgeConfig) -> Self {
        let transport = MemoryTransport::new();
        let page = MemoryPage::new();
        let (bridge, rx) = Bridge::new(&config, Rc::new(transport.clone()), page.clone(), ORIGIN);
        Self { bridge, rx, transport, page, pool: LocalPool::new() }
    }

    fn provider(&self) -> WalletProvider {
        self.bridge.provider().clone()
    }

    fn spawn<T: 'static>(&mut self, fut: impl Future<Output = T> + 'static) -> Rc<RefCell<Option<T>>> {
        let slot = Rc::new(RefCell::new(None));
        let out = slot.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                let value = fut.await;
                *out.borrow_mut() = Some(value);
            })
            .expect("spawn");
        self.pool.run_until_stalled();
        slot
    }

    /// Requests sent since the last call, as (id, method, params)
    fn requests(&self) -> Vec<(u64, String, Value)> {
        self.transport
            .drain()
            .iter()
            .filter_map(|raw| match codec::decode_outbound(raw) {
                Some(OutboundMessage::Request { id, method, params, .. }) => Some((id, method, params)),
                _ => None,
            })
            .collect()
    }

    fn only_request(&self, method: &str) -> (u64, Value) {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        let (id, sent, params) = requests.remove(0);
        assert_eq!(sent, method);
        (id, params)
    }

    /// Host → page, through the queue like a real `message` event
    fn deliver(&mut self, message: InboundMessage) {
        self.bridge.queue().push(Task::Inbound(codec::encode_inbound(&message)));
        self.bridge.drain(&mut self.rx);
        self.pool.run_until_stalled();
    }

    fn connect(&mut self) {
        let p = self.provider();
        let slot = self.spawn(async move { p.connect(false, None).await });
        let (id, _) = self.only_request("connect");
        self.deliver(InboundMessage::ok(id, account_json()));
        assert!(take(&slot).expect("connect").is_approved());
    }
}

fn take<T>(slot: &Rc<RefCell<Option<T>>>) -> T {
    slot.borrow_mut().take().expect("future still pending")
}

fn recorder() -> (Rc<RefCell<Vec<Value>>>, column_bridge::Listener) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let l = listener(move |payload: &Value| {
        sink.borrow_mut().push(payload.clone());
        Ok(())
    });
    (seen, l)
}

// =============================================================================
// CONNECTION STATE
// =============================================================================

/// Test: connect sends silent flag and origin, then caches the account
#[test]
fn connect_then_account_is_cached() {
    let mut h = Harness::new();
    let p = h.provider();
    let slot = h.spawn(async move { p.connect(false, None).await });

    let frames = h.transport.drain();
    assert_eq!(frames.len(), 1);
    let Some(OutboundMessage::Request { id, method, params, origin }) = codec::decode_outbound(&frames[0]) else {
        panic!("not a request: {}", frames[0]);
    };
    assert_eq!(method, "connect");
    assert_eq!(origin, ORIGIN);
    assert_eq!(params["silent"], json!(false));

    h.deliver(InboundMessage::ok(id, account_json()));
    match take(&slot).expect("connect") {
        UserResponse::Approved(account) => {
            assert_eq!(account.address, ADDRESS);
            assert_eq!(account.public_key, vec![0x01, 0x02, 0xab]);
        }
        UserResponse::Rejected => panic!("expected approval"),
    }
    assert!(h.provider().is_connected());
    assert_eq!(h.provider().accounts().len(), 1);

    // Cache hit: no second round trip
    let sent = h.transport.sent_count();
    let p = h.provider();
    let slot = h.spawn(async move { p.get_account().await });
    assert_eq!(h.transport.sent_count(), sent);
    assert_eq!(take(&slot).expect("account").map(|a| a.address), Some(ADDRESS.to_string()));
}

/// Test: a user decline (null result or rejection error) is Rejected, not an error
#[test]
fn connect_decline_is_rejected() {
    let mut h = Harness::new();

    let p = h.provider();
    let slot = h.spawn(async move { p.connect(false, None).await });
    let (id, _) = h.only_request("connect");
    h.deliver(InboundMessage::ok(id, Value::Null));
    assert_eq!(take(&slot).expect("connect"), UserResponse::Rejected);

    let p = h.provider();
    let slot = h.spawn(async move { p.connect(true, None).await });
    let (id, params) = h.only_request("connect");
    assert_eq!(params["silent"], json!(true));
    h.deliver(InboundMessage::err(id, "4001: User rejected the request"));
    assert_eq!(take(&slot).expect("connect"), UserResponse::Rejected);

    assert!(!h.provider().is_connected());
}

/// Test: non-rejection host errors surface with their code and status
#[test]
fn connect_host_error_is_typed() {
    let mut h = Harness::new();
    let p = h.provider();
    let slot = h.spawn(async move { p.connect(false, None).await });
    let (id, _) = h.only_request("connect");
    h.deliver(InboundMessage::err(id, "4100: Origin not allowed"));

    let err = take(&slot).expect_err("unauthorized");
    assert_eq!(err.code(), Some(4100));
    assert_eq!(err.status(), HostStatus::Unauthorized);
}

/// Test: an approved connect with an undecodable public key is a typed error, not a decline
#[test]
fn connect_malformed_account_is_invalid_response() {
    let mut h = Harness::new();
    let p = h.provider();
    let slot = h.spawn(async move { p.connect(false, None).await });
    let (id, _) = h.only_request("connect");
    h.deliver(InboundMessage::ok(id, json!({ "address": "0xABC", "publicKey": "0xabc" })));

    let err = take(&slot).expect_err("malformed key");
    assert!(matches!(err, BridgeError::InvalidResponse(_)), "{:?}", err);
    assert!(!err.is_rejection());
    assert!(!h.provider().is_connected());
}

/// Test: connect emits change carrying the new account list
#[test]
fn connect_emits_change_with_account() {
    let mut h = Harness::new();
    let (changes, l) = recorder();
    let _sub = h.provider().on("change", l);

    h.connect();
    assert_eq!(
        *changes.borrow(),
        vec![json!({ "accounts": [{ "address": ADDRESS, "publicKey": "0x0102ab", "name": null }] })]
    );
}

/// Test: account() without a cached account asks the host once and caches the answer
#[test]
fn account_round_trip_fills_cache() {
    let mut h = Harness::new();
    let p = h.provider();
    let slot = h.spawn(async move { p.get_account().await });
    let (id, _) = h.only_request("account");
    h.deliver(InboundMessage::ok(id, json!({ "account": account_json() })));

    assert_eq!(take(&slot).expect("account").map(|a| a.address), Some(ADDRESS.to_string()));
    assert!(h.provider().is_connected());
}

/// Test: disconnect clears state and emits change exactly once even when the host errors
#[test]
fn disconnect_survives_host_error() {
    let mut h = Harness::new();
    h.connect();

    let (changes, l) = recorder();
    let _sub = h.provider().on("change", l);

    let p = h.provider();
    let slot = h.spawn(async move { p.disconnect().await });
    let (id, _) = h.only_request("disconnect");
    h.deliver(InboundMessage::err(id, "Internal error"));

    take(&slot);
    assert!(!h.provider().is_connected());
    assert!(h.provider().accounts().is_empty());
    assert_eq!(*changes.borrow(), vec![json!({ "accounts": [] })]);
}

// =============================================================================
// SIGNING
// =============================================================================

/// Test: wrapped and bare transactions produce identical params
#[test]
fn sign_transaction_accepts_both_shapes() {
    let mut h = Harness::new();
    let payload = json!({ "function": "0x1::coin::transfer", "functionArguments": ["0x2", "10"] });

    let p = h.provider();
    let wrapped = json!({ "payload": payload.clone() });
    let first = h.spawn(async move { p.sign_transaction(wrapped, None).await });
    let (id_wrapped, params_wrapped) = h.only_request("signTransaction");

    let p = h.provider();
    let bare = payload.clone();
    let second = h.spawn(async move { p.sign_transaction(bare, None).await });
    let (id_bare, params_bare) = h.only_request("signTransaction");

    assert_eq!(params_wrapped, params_bare);
    assert_eq!(params_bare, json!({ "payload": payload, "asFeePayer": false }));

    h.deliver(InboundMessage::ok(id_wrapped, json!({ "authenticator": "0x01" })));
    h.deliver(InboundMessage::ok(id_bare, Value::Null));
    assert!(take(&first).expect("sign").is_approved());
    assert_eq!(take(&second).expect("sign"), UserResponse::Rejected);
}

/// Test: signAndSubmitTransaction is approved only with a non-empty hash
#[test]
fn sign_and_submit_needs_hash() {
    let mut h = Harness::new();
    let cases = [
        (InboundMessage::ok(0, json!({ "hash": "0xabc" })), true),
        (InboundMessage::ok(0, json!({})), false),
        (InboundMessage::ok(0, json!({ "hash": "" })), false),
        (InboundMessage::err(0, "User rejected the request"), false),
    ];

    for (reply, approved) in cases {
        let p = h.provider();
        let slot = h.spawn(async move { p.sign_and_submit_transaction(json!({ "payload": {} })).await });
        let (id, _) = h.only_request("signAndSubmitTransaction");
        let reply = match reply {
            InboundMessage::Response { result, error, .. } => InboundMessage::Response { id, result, error },
            other => other,
        };
        h.deliver(reply);
        assert_eq!(take(&slot).expect("submit").is_approved(), approved);
    }
}

/// Test: responses arriving out of order settle the right calls
#[test]
fn out_of_order_responses() {
    let mut h = Harness::new();

    let p = h.provider();
    let a = h.spawn(async move { p.sign_message(json!({ "message": "a" })).await });
    let p = h.provider();
    let b = h.spawn(async move { p.sign_message(json!({ "message": "b" })).await });

    let requests = h.requests();
    assert_eq!(requests.len(), 2);
    let id_of = |m: &str| requests.iter().find(|(_, _, params)| params["message"] == m).map(|(id, _, _)| *id).unwrap();
    let (id_a, id_b) = (id_of("a"), id_of("b"));
    assert_ne!(id_a, id_b);

    h.deliver(InboundMessage::ok(id_b, json!({ "signature": "sig-b" })));
    assert!(a.borrow().is_none());
    assert_eq!(take(&b).expect("b"), UserResponse::Approved(json!({ "signature": "sig-b" })));

    h.deliver(InboundMessage::ok(id_a, json!({ "signature": "sig-a" })));
    assert_eq!(take(&a).expect("a"), UserResponse::Approved(json!({ "signature": "sig-a" })));
    assert_eq!(h.provider().rpc().registry().pending_count(), 0);
}

/// Test: integers beyond 2^53 - 1 travel as strings
#[test]
fn large_integers_are_stringified() {
    let mut h = Harness::new();
    let p = h.provider();
    let _slot = h.spawn(async move { p.sign_message(json!({ "nonce": u64::MAX, "small": 7 })).await });

    let (_, params) = h.only_request("signMessage");
    assert_eq!(params["nonce"], json!("18446744073709551615"));
    assert_eq!(params["small"], json!(7));
}

/// Test: unknown ids and foreign messages are ignored
#[test]
fn stray_messages_are_ignored() {
    let mut h = Harness::new();
    let p = h.provider();
    let slot = h.spawn(async move { p.sign_message(json!({ "message": "x" })).await });
    let (id, _) = h.only_request("signMessage");

    h.deliver(InboundMessage::ok(id + 100, json!({ "signature": "wrong" })));
    h.bridge.queue().push(Task::Inbound("not json".into()));
    h.bridge.queue().push(Task::Inbound(r#"{"type":"other:thing","id":1}"#.into()));
    h.bridge.drain(&mut h.rx);
    h.pool.run_until_stalled();
    assert!(slot.borrow().is_none());
    assert_eq!(h.provider().rpc().registry().pending_count(), 1);

    h.deliver(InboundMessage::ok(id, json!({ "signature": "right" })));
    assert_eq!(take(&slot).expect("sign"), UserResponse::Approved(json!({ "signature": "right" })));
}

// =============================================================================
// QUERIES
// =============================================================================

/// Test: network() falls back to mainnet when the channel is missing
#[test]
fn network_defaults_when_offline() {
    let mut h = Harness::new();
    h.transport.set_offline(true);

    let p = h.provider();
    let slot = h.spawn(async move { p.get_network().await });
    let network = take(&slot);
    assert_eq!(network.name, "mainnet");
    assert_eq!(network.chain_id, 1);
    assert_eq!(h.provider().rpc().registry().pending_count(), 0);
}

/// Test: network() accepts a host descriptor or a bare name
#[test]
fn network_from_host() {
    let mut h = Harness::new();

    let p = h.provider();
    let slot = h.spawn(async move { p.get_network().await });
    let (id, _) = h.only_request("getNetwork");
    h.deliver(InboundMessage::ok(id, json!({ "name": "testnet", "chainId": 2 })));
    let network = take(&slot);
    assert_eq!((network.name.as_str(), network.chain_id), ("testnet", 2));

    let p = h.provider();
    let slot = h.spawn(async move { p.legacy_network().await });
    let (id, _) = h.only_request("getNetwork");
    h.deliver(InboundMessage::ok(id, json!("devnet")));
    assert_eq!(take(&slot), "devnet");
}

/// Test: sending fails fast with a disconnected error when the channel is missing
#[test]
fn offline_call_rejects_immediately() {
    let mut h = Harness::new();
    h.transport.set_offline(true);

    let p = h.provider();
    let slot = h.spawn(async move { p.sign_message(json!({ "message": "x" })).await });
    let err = take(&slot).expect_err("offline");
    assert_eq!(err.code(), Some(4900));
    assert_eq!(err.status(), HostStatus::Disconnected);
}

// =============================================================================
// EVENTS
// =============================================================================

/// Test: a throwing listener does not stop the others
#[test]
fn listeners_are_isolated() {
    let mut h = Harness::new();
    let provider = h.provider();

    provider.on_account_change(listener(|_| Err(anyhow::anyhow!("dapp listener bug"))));
    let (seen, l) = recorder();
    provider.on_account_change(l);

    h.deliver(InboundMessage::event("accountChange", account_json()));
    assert_eq!(*seen.borrow(), vec![account_json()]);
    assert_eq!(provider.emitter().listener_count("accountChange"), 2);
}

/// Test: inbound accountChange replaces connection state before listeners run
#[test]
fn inbound_account_change_syncs_state() {
    let mut h = Harness::new();
    let provider = h.provider();

    let observed = Rc::new(Cell::new(false));
    let probe = provider.clone();
    let flag = observed.clone();
    provider.on_account_change(listener(move |_| {
        flag.set(probe.is_connected());
        Ok(())
    }));

    h.deliver(InboundMessage::event("accountChange", account_json()));
    assert!(observed.get());
    assert_eq!(provider.accounts()[0].address, ADDRESS);

    h.deliver(InboundMessage::event("accountChange", Value::Null));
    assert!(!observed.get());
    assert!(provider.accounts().is_empty());
}

/// Test: inbound change with accounts connects, an empty list disconnects
#[test]
fn inbound_change_event_syncs_state() {
    let mut h = Harness::new();
    let provider = h.provider();
    let (seen, l) = recorder();
    let _sub = provider.on("change", l);

    h.deliver(InboundMessage::event("change", json!({ "accounts": [account_json()] })));
    assert!(provider.is_connected());
    assert_eq!(provider.accounts()[0].address, ADDRESS);

    // No accounts key: state untouched
    h.deliver(InboundMessage::event("change", json!({ "reason": "refresh" })));
    assert!(provider.is_connected());

    h.deliver(InboundMessage::event("change", json!({ "accounts": [] })));
    assert!(!provider.is_connected());
    assert!(provider.accounts().is_empty());
    assert_eq!(seen.borrow().len(), 3);
}

/// Test: disposing a standard subscription leaves a legacy one for the same callback
#[test]
fn legacy_listener_survives_standard_dispose() {
    let mut h = Harness::new();
    let provider = h.provider();
    let (seen, l) = recorder();

    provider.on_account_change(l.clone());
    let standard = provider.on("accountChange", l.clone());
    let twin = provider.on("accountChange", l);

    assert!(standard.dispose());
    h.deliver(InboundMessage::event("accountChange", account_json()));
    assert_eq!(seen.borrow().len(), 2);

    assert!(twin.dispose());
    h.deliver(InboundMessage::event("accountChange", account_json()));
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(provider.emitter().listener_count("accountChange"), 1);
}

/// Test: networkChange and unknown events reach their listeners verbatim
#[test]
fn other_events_fan_out() {
    let mut h = Harness::new();
    let provider = h.provider();

    let (networks, l) = recorder();
    provider.on_network_change(l);
    let (custom, l) = recorder();
    let _sub = provider.on("column:custom", l);

    h.deliver(InboundMessage::event("networkChange", json!({ "name": "testnet" })));
    h.deliver(InboundMessage::event("column:custom", json!([1, 2])));
    assert_eq!(*networks.borrow(), vec![json!({ "name": "testnet" })]);
    assert_eq!(*custom.borrow(), vec![json!([1, 2])]);
}

/// Test: standard:events disposer removes exactly that subscription
#[test]
fn disposer_removes_one_listener() {
    let mut h = Harness::new();
    let provider = h.provider();

    let (kept, l) = recorder();
    let _keep = provider.on("accountChange", l);
    let (gone, l) = recorder();
    let dispose = provider.on("accountChange", l);

    assert!(dispose.dispose());
    assert!(!dispose.dispose());

    h.deliver(InboundMessage::event("accountChange", account_json()));
    assert_eq!(kept.borrow().len(), 1);
    assert!(gone.borrow().is_empty());
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// Test: starting twice re-dispatches but never adds listeners or timers
#[test]
fn discovery_is_idempotent() {
    let mut h = Harness::new();
    h.bridge.start();
    h.bridge.start();

    assert_eq!(h.page.count("listen:wallet-standard:app-ready"), 1);
    assert_eq!(h.page.count("listen:wallet-standard:register-wallet"), 1);
    assert_eq!(h.page.listener_count(), 2);
    assert_eq!(h.page.pending_timers(), vec![0, 100, 500, 1500]);
    assert_eq!(h.page.count("announce:wallet-standard:register-wallet"), 2);
    assert_eq!(h.page.count("global:column"), 2);
    assert_eq!(h.page.count("dispatch:aptos#initialized"), 2);
    assert_eq!(h.bridge.discovery().phase(), Phase::Announcing);

    assert_eq!(h.page.fire_timers(), 4);
    assert_eq!(h.bridge.drain(&mut h.rx), 4);
    assert_eq!(h.bridge.discovery().phase(), Phase::Steady);
    assert_eq!(h.bridge.discovery().announcements(), 6);
}

/// Test: a failing path is reported and the rest still run
#[test]
fn discovery_failures_are_isolated() {
    let h = Harness::new();
    h.page.fail_on("global:aptos");
    h.page.fail_on("dispatch:column#initialized");
    h.bridge.start();

    for action in ["global:column", "global:petra", "announce:wallet-standard:register-wallet", "dispatch:aptos#initialized"] {
        assert_eq!(h.page.count(action), 1, "{}", action);
    }

    let logs: Vec<Value> = h
        .transport
        .drain()
        .iter()
        .filter_map(|raw| match codec::decode_outbound(raw) {
            Some(OutboundMessage::Log { data, .. }) => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["path"], json!("assign_global"));
    assert_eq!(logs[0]["target"], json!("aptos"));
    assert_eq!(logs[1]["target"], json!("column#initialized"));
}

/// Test: a timer that cannot be scheduled is reported as a schedule failure
#[test]
fn discovery_schedule_failure_is_reported() {
    let mut h = Harness::new();
    h.page.fail_on("schedule:100");
    h.bridge.start();

    assert_eq!(h.page.pending_timers(), vec![0, 500, 1500]);
    let logs: Vec<Value> = h
        .transport
        .drain()
        .iter()
        .filter_map(|raw| match codec::decode_outbound(raw) {
            Some(OutboundMessage::Log { data, .. }) => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["path"], json!("schedule"));
    assert_eq!(logs[0]["target"], json!("retry #1"));
    assert_eq!(logs[0]["error"], json!("schedule 'announce' after 100ms failed: simulated page failure"));

    assert_eq!(h.page.fire_timers(), 3);
    h.bridge.drain(&mut h.rx);
    assert_eq!(h.bridge.discovery().phase(), Phase::Steady);
}

/// Test: a custom config changes globals and schedule
#[test]
fn discovery_follows_config() {
    let config = BridgeConfig::new("Column")
        .with_global_names(vec!["myWallet".into()])
        .with_legacy_events(vec![])
        .with_announce_delays(vec![]);
    let h = Harness::with_config(config);
    h.bridge.start();

    assert_eq!(
        h.page.actions(),
        vec![
            "listen:wallet-standard:app-ready",
            "listen:wallet-standard:register-wallet",
            "global:myWallet",
            "announce:wallet-standard:register-wallet",
        ]
    );
    assert_eq!(h.bridge.discovery().phase(), Phase::Steady);
}

struct RegisterPayload {
    registered: Rc<Cell<usize>>,
    fail: bool,
}

impl HandshakePayload for RegisterPayload {
    fn register_wallet(&self) -> Option<Result<(), PageError>> {
        self.registered.set(self.registered.get() + 1);
        Some(if self.fail { Err(PageError::Handshake("register threw".into())) } else { Ok(()) })
    }

    fn invoke_callback(&self) -> Option<Result<(), PageError>> {
        None
    }
}

/// Test: page app-ready is answered on the consumer turn, not inside the page callback
#[test]
fn app_ready_handshake() {
    let mut h = Harness::new();
    h.bridge.start();
    h.transport.drain();

    let registered = Rc::new(Cell::new(0));
    let count = registered.clone();
    let reached = h.page.raise("wallet-standard:app-ready", move || {
        Box::new(RegisterPayload { registered: count.clone(), fail: false }) as Box<dyn HandshakePayload>
    });
    assert_eq!(reached, 1);
    assert_eq!(registered.get(), 0);

    h.bridge.drain(&mut h.rx);
    assert_eq!(registered.get(), 1);
    assert_eq!(h.transport.sent_count(), 0);

    // A throwing register() is reported, not propagated
    let count = registered.clone();
    h.page.raise("wallet-standard:app-ready", move || {
        Box::new(RegisterPayload { registered: count.clone(), fail: true }) as Box<dyn HandshakePayload>
    });
    h.bridge.drain(&mut h.rx);
    assert_eq!(registered.get(), 2);
    assert_eq!(h.transport.drain().len(), 1);
}

// =============================================================================
// FEATURE DISPATCH AND LEGACY SHIMS
// =============================================================================

/// Test: invoke routes feature operations with page-style arguments
#[test]
fn invoke_dispatches_features() {
    let mut h = Harness::new();
    let op = h.provider().features().resolve("aptos:signTransaction", "signTransaction").expect("feature");
    assert_eq!(op, Operation::SignTransaction);

    let p = h.provider();
    let args = [json!({ "payload": { "function": "0x1::m::f" } }), json!(true)];
    let slot = h.spawn(async move { p.invoke(op, &args).await });
    let (id, params) = h.only_request("signTransaction");
    assert_eq!(params, json!({ "payload": { "function": "0x1::m::f" }, "asFeePayer": true }));

    h.deliver(InboundMessage::ok(id, json!({ "authenticator": "0x09" })));
    assert_eq!(
        take(&slot).expect("invoke"),
        json!({ "status": "Approved", "args": { "authenticator": "0x09" } })
    );

    let p = h.provider();
    let slot = h.spawn(async move { p.invoke(Operation::ChangeNetwork, &[json!({ "name": "testnet" })]).await });
    assert_eq!(take(&slot).expect("changeNetwork")["status"], json!("Approved"));
    assert!(h.requests().is_empty());

    let p = h.provider();
    let slot = h.spawn(async move { p.invoke(Operation::On, &[]).await });
    assert!(take(&slot).is_err());
}

/// Test: legacy shims throw 4001 on decline and 4100 without an account
#[test]
fn legacy_shims_throw_codes() {
    let mut h = Harness::new();

    let p = h.provider();
    let slot = h.spawn(async move { p.legacy_connect().await });
    let (id, _) = h.only_request("connect");
    h.deliver(InboundMessage::err(id, "4001: User rejected the request"));
    assert_eq!(take(&slot).expect_err("declined").code(), Some(4001));

    let p = h.provider();
    let slot = h.spawn(async move { p.legacy_account().await });
    let (id, _) = h.only_request("account");
    h.deliver(InboundMessage::ok(id, Value::Null));
    assert_eq!(take(&slot).expect_err("no account").code(), Some(4100));

    let p = h.provider();
    let slot = h.spawn(async move { p.legacy_sign_and_submit_transaction(json!({})).await });
    let (id, _) = h.only_request("signAndSubmitTransaction");
    h.deliver(InboundMessage::ok(id, json!({ "hash": "0xfeed" })));
    assert_eq!(take(&slot).expect("submitted"), json!({ "hash": "0xfeed" }));
}
