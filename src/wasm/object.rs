//! The page-facing wallet object
//!
//! ```text
//! {
//!   name, url, version, icon, chains,
//!   accounts,                              getter over the live state
//!   features: { "aptos:connect": { version, connect }, ... },
//!   isColumn / isPetra / isAptos,          identity flags
//!   connect, disconnect, account, network, legacy shims
//!   signMessage, signAndSubmitTransaction,
//!   onAccountChange, onNetworkChange,
//! }
//! ```
//!
//! Every function routes into `WalletProvider`; nothing here keeps state
//! except the callback table that maps page functions to listeners.

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

use super::convert::{describe, from_js, js_error, to_js};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{listener, Listener};
use crate::provider::{Operation, WalletProvider};

/// Page callbacks wrapped as listeners. A function registered twice maps
/// to the same `Listener`, so the emitter can deduplicate it.
#[derive(Clone, Default)]
pub struct Callbacks {
    table: Rc<RefCell<Vec<(Function, Listener)>>>,
}

impl Callbacks {
    pub fn wrap(&self, callback: Function) -> Listener {
        let mut table = self.table.borrow_mut();
        if let Some((_, existing)) = table.iter().find(|(f, _)| Object::is(f, &callback)) {
            return existing.clone();
        }
        let f = callback.clone();
        let wrapped = listener(move |payload: &Value| {
            f.call1(&JsValue::UNDEFINED, &to_js(payload))
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("listener threw: {}", describe(&e)))
        });
        table.push((callback, wrapped.clone()));
        wrapped
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }
}

fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

fn promise<F>(fut: F) -> Promise
where
    F: Future<Output = BridgeResult<Value>> + 'static,
{
    future_to_promise(async move { fut.await.map(|v| to_js(&v)).map_err(|e| js_error(&e)) })
}

fn callback_arg(value: JsValue, op: &str) -> Result<Function, BridgeError> {
    value
        .dyn_into::<Function>()
        .map_err(|_| BridgeError::InvalidArgument(format!("{} expects a function", op)))
}

/// Fill `object` in place; `DomPage` already holds a reference to it
pub fn populate(object: &Object, provider: &WalletProvider, config: &BridgeConfig, callbacks: &Callbacks) -> Result<(), JsValue> {
    let target: &JsValue = object.as_ref();
    let info = provider.info();

    set(target, "name", &JsValue::from_str(&info.name))?;
    set(target, "url", &JsValue::from_str(&info.url))?;
    set(target, "version", &JsValue::from_str(&info.version))?;
    set(target, "icon", &JsValue::from_str(&info.icon))?;
    let chains: Array = info.chains.iter().map(|c| JsValue::from_str(c)).collect();
    set(target, "chains", &chains)?;

    define_accounts_getter(object, provider)?;
    set(target, "features", &features_object(provider, callbacks)?)?;

    for flag in &config.identity_flags {
        set(target, flag, &JsValue::TRUE)?;
    }

    install_legacy(target, provider, callbacks)?;
    Ok(())
}

fn define_accounts_getter(object: &Object, provider: &WalletProvider) -> Result<(), JsValue> {
    let provider = provider.clone();
    let getter = Closure::<dyn Fn() -> JsValue>::new(move || to_js(&provider.state().accounts_value())).into_js_value();
    let descriptor = Object::new();
    set(&descriptor, "get", &getter)?;
    set(&descriptor, "enumerable", &JsValue::TRUE)?;
    Object::define_property(object, &JsValue::from_str("accounts"), &descriptor);
    Ok(())
}

fn features_object(provider: &WalletProvider, callbacks: &Callbacks) -> Result<Object, JsValue> {
    let features = Object::new();
    for (key, descriptor) in provider.features().iter() {
        let entry = Object::new();
        set(&entry, "version", &JsValue::from_str(&descriptor.version))?;
        for op in descriptor.operations.iter().copied() {
            set(&entry, op.js_name(), &operation_fn(op, provider, callbacks))?;
        }
        set(&features, key, &Object::freeze(&entry))?;
    }
    Ok(Object::freeze(&features))
}

fn operation_fn(op: Operation, provider: &WalletProvider, callbacks: &Callbacks) -> JsValue {
    let provider = provider.clone();
    match op {
        Operation::OnAccountChange | Operation::OnNetworkChange => {
            let callbacks = callbacks.clone();
            Closure::<dyn Fn(JsValue) -> Promise>::new(move |cb: JsValue| {
                match callback_arg(cb, op.js_name()) {
                    Ok(f) => {
                        let l = callbacks.wrap(f);
                        if op == Operation::OnAccountChange {
                            provider.on_account_change(l);
                        } else {
                            provider.on_network_change(l);
                        }
                        Promise::resolve(&JsValue::UNDEFINED)
                    }
                    Err(e) => Promise::reject(&js_error(&e)),
                }
            })
            .into_js_value()
        }
        Operation::On => {
            let callbacks = callbacks.clone();
            Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(move |event: JsValue, cb: JsValue| {
                let Some(event) = event.as_string() else {
                    tracing::warn!("standard:events.on called without an event name");
                    return Closure::<dyn Fn()>::new(|| {}).into_js_value();
                };
                match callback_arg(cb, "on") {
                    Ok(f) => {
                        let disposer = provider.on(&event, callbacks.wrap(f));
                        Closure::<dyn Fn()>::new(move || {
                            disposer.dispose();
                        })
                        .into_js_value()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "standard:events.on ignored");
                        Closure::<dyn Fn()>::new(|| {}).into_js_value()
                    }
                }
            })
            .into_js_value()
        }
        _ => Closure::<dyn Fn(JsValue, JsValue) -> Promise>::new(move |a: JsValue, b: JsValue| {
            let provider = provider.clone();
            let args = [from_js(&a), from_js(&b)];
            promise(async move { provider.invoke(op, &args).await })
        })
        .into_js_value(),
    }
}

// =============================================================================
// LEGACY (window.aptos style)
// =============================================================================

fn install_legacy(target: &JsValue, provider: &WalletProvider, callbacks: &Callbacks) -> Result<(), JsValue> {
    let p = provider.clone();
    set(target, "connect", &Closure::<dyn Fn() -> Promise>::new(move || {
        let p = p.clone();
        promise(async move { Ok(p.legacy_connect().await?.to_value()) })
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "disconnect", &Closure::<dyn Fn() -> Promise>::new(move || {
        let p = p.clone();
        promise(async move {
            p.legacy_disconnect().await;
            Ok(Value::Null)
        })
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "account", &Closure::<dyn Fn() -> Promise>::new(move || {
        let p = p.clone();
        promise(async move { Ok(p.legacy_account().await?.to_value()) })
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "network", &Closure::<dyn Fn() -> Promise>::new(move || {
        let p = p.clone();
        promise(async move { Ok(Value::String(p.legacy_network().await)) })
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "isConnected", &Closure::<dyn Fn() -> Promise>::new(move || {
        Promise::resolve(&JsValue::from_bool(p.is_connected()))
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "signMessage", &Closure::<dyn Fn(JsValue) -> Promise>::new(move |input: JsValue| {
        let p = p.clone();
        let input = from_js(&input);
        promise(async move { p.legacy_sign_message(input).await })
    }).into_js_value())?;

    let p = provider.clone();
    set(target, "signAndSubmitTransaction", &Closure::<dyn Fn(JsValue) -> Promise>::new(move |input: JsValue| {
        let p = p.clone();
        let input = from_js(&input);
        promise(async move { p.legacy_sign_and_submit_transaction(input).await })
    }).into_js_value())?;

    let (p, cbs) = (provider.clone(), callbacks.clone());
    set(target, "onAccountChange", &Closure::<dyn Fn(JsValue)>::new(move |cb: JsValue| {
        match callback_arg(cb, "onAccountChange") {
            Ok(f) => p.legacy_on_account_change(cbs.wrap(f)),
            Err(e) => tracing::warn!(error = %e, "legacy onAccountChange ignored"),
        }
    }).into_js_value())?;

    let (p, cbs) = (provider.clone(), callbacks.clone());
    set(target, "onNetworkChange", &Closure::<dyn Fn(JsValue)>::new(move |cb: JsValue| {
        match callback_arg(cb, "onNetworkChange") {
            Ok(f) => p.legacy_on_network_change(cbs.wrap(f)),
            Err(e) => tracing::warn!(error = %e, "legacy onNetworkChange ignored"),
        }
    }).into_js_value())?;

    Ok(())
}
