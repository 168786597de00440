//! Webview transport: `window.ReactNativeWebView.postMessage(string)`
//!
//! The channel object is looked up on every send; it may be injected after
//! this script runs, and a page may delete or replace it.

use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

use crate::error::TransportError;
use crate::transport::Transport;

const CHANNEL: &str = "ReactNativeWebView";
const POST: &str = "postMessage";

pub struct WebViewTransport {
    window: Window,
}

impl WebViewTransport {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Transport for WebViewTransport {
    fn send(&self, raw: &str) -> Result<(), TransportError> {
        let channel = Reflect::get(&self.window, &JsValue::from_str(CHANNEL))
            .ok()
            .filter(|c| c.is_object())
            .ok_or_else(|| TransportError(format!("window.{} missing", CHANNEL)))?;

        let post = Reflect::get(&channel, &JsValue::from_str(POST))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| TransportError(format!("{}.{} is not a function", CHANNEL, POST)))?;

        post.call1(&channel, &JsValue::from_str(raw))
            .map(|_| ())
            .map_err(|e| TransportError(format!("{}: {:?}", POST, e)))
    }
}
