//! DomPage: `Page` over the real window

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, CustomEventInit, Event, Window};

use super::convert::describe;
use crate::discovery::{HandshakePayload, Page};
use crate::error::PageError;
use crate::queue::{Task, TaskQueue};

pub struct DomPage {
    window: Window,
    wallet: Object,
    /// `(api) => api.register(wallet)`; one instance so repeated
    /// announcements carry the same identity
    announce_detail: JsValue,
    /// `{ register(wallet) }` handed to function-form payloads. Those are
    /// announcement callbacks from wallets (this one included), so
    /// `register` keeps nothing.
    register_api: JsValue,
}

impl DomPage {
    pub fn new(window: Window, wallet: Object) -> Self {
        let announce_detail = {
            let wallet = wallet.clone();
            Closure::<dyn Fn(JsValue) -> JsValue>::new(move |api: JsValue| {
                match call_method(&api, "register", &wallet) {
                    Ok(unregister) => unregister,
                    Err(e) => {
                        tracing::warn!(error = %e, "page register() threw");
                        JsValue::UNDEFINED
                    }
                }
            })
            .into_js_value()
        };

        let register_api = Object::new();
        let register = Closure::<dyn Fn(JsValue) -> JsValue>::new(|_wallet: JsValue| {
            tracing::debug!("wallet callback answered, nothing to register on this side");
            Closure::<dyn Fn()>::new(|| {}).into_js_value()
        })
        .into_js_value();
        let _ = Reflect::set(&register_api, &JsValue::from_str("register"), &register);

        Self { window, wallet, announce_detail, register_api: register_api.into() }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn wallet(&self) -> &Object {
        &self.wallet
    }
}

impl Page for DomPage {
    fn announce(&self, event: &str) -> Result<(), PageError> {
        let init = CustomEventInit::new();
        init.set_detail(&self.announce_detail);
        let custom = CustomEvent::new_with_event_init_dict(event, &init)
            .map_err(|e| PageError::Dispatch { event: event.into(), reason: describe(&e) })?;
        self.window
            .dispatch_event(&custom)
            .map(|_| ())
            .map_err(|e| PageError::Dispatch { event: event.into(), reason: describe(&e) })
    }

    fn dispatch(&self, event: &str) -> Result<(), PageError> {
        let plain = Event::new(event).map_err(|e| PageError::Dispatch { event: event.into(), reason: describe(&e) })?;
        self.window
            .dispatch_event(&plain)
            .map(|_| ())
            .map_err(|e| PageError::Dispatch { event: event.into(), reason: describe(&e) })
    }

    fn assign_global(&self, name: &str) -> Result<(), PageError> {
        match Reflect::set(&self.window, &JsValue::from_str(name), &self.wallet) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PageError::AssignGlobal { name: name.into(), reason: "property is read-only".into() }),
            Err(e) => Err(PageError::AssignGlobal { name: name.into(), reason: describe(&e) }),
        }
    }

    fn listen(&self, event: &str, queue: TaskQueue) -> Result<(), PageError> {
        let name = event.to_string();
        let wallet = self.wallet.clone();
        let api = self.register_api.clone();
        let handler = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
            let detail = e
                .dyn_ref::<CustomEvent>()
                .map(|custom| custom.detail())
                .unwrap_or(JsValue::UNDEFINED);
            let payload = JsPayload { detail, wallet: wallet.clone(), api: api.clone() };
            queue.push(Task::Handshake { event: name.clone(), payload: Box::new(payload) });
        });
        self.window
            .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
            .map_err(|e| PageError::Listen { event: event.into(), reason: describe(&e) })?;
        // lives for the page lifetime
        handler.forget();
        Ok(())
    }

    fn schedule(&self, delay_ms: u32, task: Task, queue: TaskQueue) -> Result<(), PageError> {
        let label = task.kind();
        let fire = Closure::once_into_js(move || {
            queue.push(task);
        });
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(fire.unchecked_ref(), delay_ms.min(i32::MAX as u32) as i32)
            .map(|_| ())
            .map_err(|e| PageError::Schedule { task: label.to_string(), delay_ms, reason: describe(&e) })
    }
}

/// Detail of a page-raised discovery event
struct JsPayload {
    detail: JsValue,
    wallet: Object,
    api: JsValue,
}

impl HandshakePayload for JsPayload {
    fn register_wallet(&self) -> Option<Result<(), PageError>> {
        if !self.detail.is_object() || self.detail.is_function() {
            return None;
        }
        let register = Reflect::get(&self.detail, &JsValue::from_str("register"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(
            register
                .call1(&self.detail, &self.wallet)
                .map(|_| ())
                .map_err(|e| PageError::Handshake(describe(&e))),
        )
    }

    fn invoke_callback(&self) -> Option<Result<(), PageError>> {
        let callback = self.detail.dyn_ref::<Function>()?;
        Some(
            callback
                .call1(&JsValue::UNDEFINED, &self.api)
                .map(|_| ())
                .map_err(|e| PageError::Handshake(describe(&e))),
        )
    }
}

fn call_method(target: &JsValue, name: &str, arg: &JsValue) -> Result<JsValue, String> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .map_err(|e| describe(&e))?
        .dyn_into::<Function>()
        .map_err(|_| format!("{} is not a function", name))?;
    method.call1(target, arg).map_err(|e| describe(&e))
}
