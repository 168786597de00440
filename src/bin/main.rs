//! column-bridge CLI - inspect the wire protocol without a webview
//!
//!   column-bridge encode <json>        → wire string for an outbound message
//!   column-bridge decode <raw>         → recognised inbound message, or null
//!   column-bridge simulate [--reject]  → scripted dApp session against a mock host
//!
//! Options:
//!   --config <path>   BridgeConfig JSON (simulate)
//!   --origin <url>    page origin (simulate, default https://dapp.example)
//!   --json            compact JSON output (default for non-tty)
//!   --pretty          pretty JSON output (default for tty)

use anyhow::{anyhow, bail, Context};
use column_bridge::core::codec::{self, InboundMessage, OutboundMessage};
use column_bridge::core::names::method;
use column_bridge::discovery::MemoryPage;
use column_bridge::{init_logging, Bridge, BridgeConfig, MemoryTransport, Task, TaskReceiver};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::env;
use std::future::Future;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::{debug, info};

const DEFAULT_ORIGIN: &str = "https://dapp.example";

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("column-bridge {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("encode") => cmd_encode(&opts),
        Some("decode") => cmd_decode(&opts),
        Some("simulate") | Some("sim") => cmd_simulate(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{:#}", e) }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    input: Option<String>,
    config: Option<String>,
    origin: Option<String>,
    reject: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "-V" | "--version" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--reject" => opts.reject = true,
                "--config" => {
                    i += 1;
                    opts.config = args.get(i).cloned();
                }
                "--origin" => {
                    i += 1;
                    opts.origin = args.get(i).cloned();
                }
                _ => positional.push(arg.clone()),
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.input = positional.next();
        opts
    }
}

fn print_usage() {
    println!(
        r#"column-bridge - in-page wallet bridge protocol tool

USAGE:
    column-bridge <command> [options]

COMMANDS:
    encode <json>          Encode an outbound message (column:request / column:log)
    decode <raw>           Decode an inbound string (column:response / column:event)
    simulate [--reject]    Run a scripted dApp session against a mock host

OPTIONS:
    --config <path>        BridgeConfig JSON file
    --origin <url>         Page origin for simulate
    --json                 Compact output
    --pretty               Pretty output
    -h, --help             Show this help
    -V, --version          Show version

ENVIRONMENT:
    RUST_LOG               Log filter (default: info)
    COLUMN_BRIDGE_LOG      Log format: pretty, compact or json

EXAMPLES:
    column-bridge encode '{{"type":"column:request","id":1,"method":"connect","params":{{}},"origin":"https://a.xyz"}}'
    column-bridge decode '{{"type":"column:response","id":1,"result":null}}'
    column-bridge simulate --reject"#
    );
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

fn cmd_encode(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let input = opts.input.as_deref().context("encode needs a JSON message")?;
    let message = codec::decode_outbound(input)
        .ok_or_else(|| anyhow!("not an outbound message (expected type column:request or column:log)"))?;
    let raw = codec::encode(&message);
    debug!(len = raw.len(), "encoded");
    Ok(json!({ "raw": raw }))
}

fn cmd_decode(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let input = opts.input.as_deref().context("decode needs a raw string")?;
    Ok(match codec::decode(input) {
        Some(InboundMessage::Response { id, result, error }) => json!({
            "type": "response",
            "id": id,
            "result": result,
            "error": error.as_ref().map(codec::error_text),
        }),
        Some(InboundMessage::Event { event, data }) => json!({ "type": "event", "event": event, "data": data }),
        Some(InboundMessage::Unrecognized) | None => Value::Null,
    })
}

// =============================================================================
// SIMULATE
// =============================================================================

/// Answers every request the way an approving (or declining) host would
struct MockHost {
    reject: bool,
    account: Value,
}

impl MockHost {
    fn new(reject: bool) -> Self {
        Self {
            reject,
            account: json!({
                "address": "0x8f3a1c0b7e2d4a5f9c6e1b0a3d2f4e5c6b7a8d9e0f1a2b3c4d5e6f708192a3b4",
                "publicKey": "0x2c4e6a8c0e2f4a6c8e0a2c4e6a8c0e2f4a6c8e0a2c4e6a8c0e2f4a6c8e0a2c4e",
                "name": "Column Demo",
            }),
        }
    }

    fn answer(&self, message: &OutboundMessage) -> Option<InboundMessage> {
        let OutboundMessage::Request { id, method: name, .. } = message else {
            return None;
        };
        let id = *id;
        let approval = matches!(
            name.as_str(),
            method::CONNECT | method::SIGN_MESSAGE | method::SIGN_TRANSACTION | method::SIGN_AND_SUBMIT
        );
        if self.reject && approval {
            return Some(InboundMessage::err(id, "4001: User rejected the request"));
        }
        Some(match name.as_str() {
            method::CONNECT | method::ACCOUNT => InboundMessage::ok(id, self.account.clone()),
            method::GET_NETWORK => InboundMessage::ok(id, json!({ "name": "mainnet", "chainId": 1 })),
            method::SIGN_MESSAGE => InboundMessage::ok(id, json!({ "signature": "0x51" })),
            method::SIGN_TRANSACTION => InboundMessage::ok(id, json!({ "authenticator": "0x52" })),
            method::SIGN_AND_SUBMIT => InboundMessage::ok(id, json!({ "hash": "0x7f3e" })),
            method::DISCONNECT => InboundMessage::ok(id, Value::Null),
            other => InboundMessage::err(id, format!("4200: Unsupported method {}", other)),
        })
    }
}

struct Session {
    bridge: Bridge<MemoryPage>,
    rx: TaskReceiver,
    transport: MemoryTransport,
    host: MockHost,
    transcript: Vec<Value>,
}

impl Session {
    /// Deliver outbound frames to the host and its answers back to the page
    fn pump(&mut self) -> usize {
        let frames = self.transport.drain();
        let count = frames.len();
        for raw in frames {
            self.transcript.push(json!({ "to": "host", "raw": raw }));
            let Some(message) = codec::decode_outbound(&raw) else { continue };
            if let Some(reply) = self.host.answer(&message) {
                let reply = codec::encode_inbound(&reply);
                self.transcript.push(json!({ "to": "page", "raw": reply }));
                self.bridge.queue().push(Task::Inbound(reply));
            }
        }
        self.bridge.drain(&mut self.rx);
        count
    }

    fn drive<T, F>(&mut self, step: &str, fut: F) -> anyhow::Result<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        let mut pool = LocalPool::new();
        let slot: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let out = slot.clone();
        pool.spawner()
            .spawn_local(async move {
                let value = fut.await;
                *out.borrow_mut() = Some(value);
            })
            .map_err(|e| anyhow!("spawn {}: {:?}", step, e))?;

        loop {
            pool.run_until_stalled();
            if let Some(value) = slot.borrow_mut().take() {
                return Ok(value);
            }
            if self.pump() == 0 {
                pool.run_until_stalled();
                if let Some(value) = slot.borrow_mut().take() {
                    return Ok(value);
                }
                bail!("{} stalled with nothing in flight", step);
            }
        }
    }
}

fn cmd_simulate(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = match &opts.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
            BridgeConfig::from_json(&raw)?
        }
        None => BridgeConfig::default(),
    };
    let origin = opts.origin.as_deref().unwrap_or(DEFAULT_ORIGIN);

    let transport = MemoryTransport::new();
    let page = MemoryPage::new();
    let (bridge, rx) = Bridge::new(&config, Rc::new(transport.clone()), page.clone(), origin);
    let mut session = Session { bridge, rx, transport, host: MockHost::new(opts.reject), transcript: Vec::new() };

    info!(reject = opts.reject, origin, "simulating dApp session");
    session.bridge.start();
    page.fire_timers();
    session.bridge.drain(&mut session.rx);
    session.pump();

    let provider = session.bridge.provider().clone();
    let mut steps = Vec::new();

    let p = provider.clone();
    let connect = session.drive("connect", async move { p.connect(false, None).await })??;
    steps.push(json!({ "step": "connect", "result": connect.map(|a| a.to_value()).to_value() }));

    let p = provider.clone();
    let account = session.drive("account", async move { p.get_account().await })?;
    steps.push(json!({
        "step": "account",
        "result": match account {
            Ok(account) => account.map_or(Value::Null, |a| a.to_value()),
            Err(e) => json!({ "error": e.to_string(), "code": e.code() }),
        },
    }));

    let p = provider.clone();
    let network = session.drive("network", async move { p.get_network().await })?;
    steps.push(json!({ "step": "network", "result": serde_json::to_value(network)? }));

    let p = provider.clone();
    let tx = json!({ "payload": { "function": "0x1::aptos_account::transfer", "functionArguments": ["0x1", "100"] } });
    let submitted = session.drive("signAndSubmitTransaction", async move { p.sign_and_submit_transaction(tx).await })??;
    steps.push(json!({ "step": "signAndSubmitTransaction", "result": submitted.to_value() }));

    let p = provider.clone();
    session.drive("disconnect", async move { p.disconnect().await })?;
    steps.push(json!({ "step": "disconnect", "connected": provider.is_connected() }));

    Ok(json!({
        "origin": origin,
        "discovery": {
            "phase": format!("{:?}", session.bridge.discovery().phase()),
            "announcements": session.bridge.discovery().announcements(),
            "actions": page.actions(),
        },
        "steps": steps,
        "transcript": session.transcript,
    }))
}
