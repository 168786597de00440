//! WASM module: the injected in-page bridge
//!
//! The webview loads the module and calls `install()` once per document.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      wallet object (page-facing)        │
//! │  features, legacy shims, accounts       │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      Bridge<DomPage> + TaskQueue        │
//! │  provider, discovery, consumer loop     │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      WebViewTransport / message         │
//! │  ReactNativeWebView.postMessage         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage from JavaScript
//!
//! ```javascript
//! import init, { install } from 'column-bridge';
//!
//! await init();
//! const wallet = install({ wallet: { name: 'Column' } });
//! window.__columnBridge.log('page ready', { href: location.href });
//! ```

mod convert;
mod object;
mod page;
mod transport;

pub use object::Callbacks;
pub use page::DomPage;
pub use transport::WebViewTransport;

use js_sys::{Object, Reflect};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, MessageEvent, Window};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::queue::{Task, TaskQueue};
use convert::from_js;

/// Global holding the installed bridge; a second `install()` reuses it
const HANDLE: &str = "__columnBridge";

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = tracing_subscriber::fmt()
        .with_writer(tracing_subscriber_wasm::MakeConsoleWriter::default().map_trace_level_to(tracing::Level::DEBUG))
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_ansi(false)
        .try_init();
}

/// Create the wallet, announce it and start consuming host frames.
/// Returns the wallet object.
#[wasm_bindgen]
pub fn install(config: JsValue) -> Result<JsValue, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    if let Some(existing) = installed(&window) {
        tracing::debug!("bridge already installed, re-announcing");
        if let Ok(announce) = Reflect::get(&existing, &JsValue::from_str("announce")) {
            if let Some(announce) = announce.dyn_ref::<js_sys::Function>() {
                let _ = announce.call0(&existing);
            }
        }
        return Reflect::get(&existing, &JsValue::from_str("wallet"));
    }

    let config: BridgeConfig = if config.is_undefined() || config.is_null() {
        BridgeConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;

    let origin = window.location().origin().unwrap_or_default();
    let wallet = Object::new();
    let page = DomPage::new(window.clone(), wallet.clone());
    let transport = Rc::new(WebViewTransport::new(window.clone()));
    let (bridge, rx) = Bridge::new(&config, transport, page, &origin);

    let callbacks = Callbacks::default();
    object::populate(&wallet, bridge.provider(), &config, &callbacks)?;

    forward_messages(&window, bridge.queue());

    let bridge = Rc::new(bridge);
    wasm_bindgen_futures::spawn_local(bridge.clone().run(rx));
    bridge.start();

    expose_handle(&window, &bridge, &wallet)?;
    Ok(wallet.into())
}

fn installed(window: &Window) -> Option<JsValue> {
    Reflect::get(window, &JsValue::from_str(HANDLE))
        .ok()
        .filter(|handle| handle.is_object())
}

/// Host frames arrive as `message` events on window (iOS) or document (Android)
fn forward_messages(window: &Window, queue: TaskQueue) {
    let handler = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
        let Some(message) = e.dyn_ref::<MessageEvent>() else { return };
        let data = message.data();
        let raw = match data.as_string() {
            Some(raw) => raw,
            None if data.is_object() => match js_sys::JSON::stringify(&data) {
                Ok(raw) => String::from(raw),
                Err(_) => return,
            },
            None => return,
        };
        queue.push(Task::Inbound(raw));
    });

    let listener: &js_sys::Function = handler.as_ref().unchecked_ref();
    if let Err(e) = window.add_event_listener_with_callback("message", listener) {
        tracing::warn!(error = %convert::describe(&e), "window message listener failed");
    }
    match window.document() {
        Some(document) => {
            if let Err(e) = document.add_event_listener_with_callback("message", listener) {
                tracing::warn!(error = %convert::describe(&e), "document message listener failed");
            }
        }
        None => tracing::debug!("no document, listening on window only"),
    }
    handler.forget();
}

/// `window.__columnBridge = { wallet, log(message, data), announce() }`
fn expose_handle(window: &Window, bridge: &Rc<Bridge<DomPage>>, wallet: &Object) -> Result<(), JsValue> {
    let handle = Object::new();
    Reflect::set(&handle, &JsValue::from_str("wallet"), wallet)?;

    let provider = bridge.provider().clone();
    let log = Closure::<dyn Fn(JsValue, JsValue)>::new(move |message: JsValue, data: JsValue| {
        let message = message.as_string().unwrap_or_default();
        provider.log(&message, from_js(&data));
    });
    Reflect::set(&handle, &JsValue::from_str("log"), &log.into_js_value())?;

    let bridge = bridge.clone();
    let announce = Closure::<dyn Fn()>::new(move || bridge.start());
    Reflect::set(&handle, &JsValue::from_str("announce"), &announce.into_js_value())?;

    Reflect::set(window, &JsValue::from_str(HANDLE), &handle)?;
    Ok(())
}
