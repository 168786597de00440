//! JsValue <-> serde_json::Value, and errors as page-visible objects

use js_sys::{Reflect, JSON};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::core::codec;
use crate::error::BridgeError;

pub fn to_js(value: &Value) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    codec::bignum_safe(value.clone())
        .serialize(&serializer)
        .unwrap_or(JsValue::UNDEFINED)
}

/// Page arguments. `undefined` becomes `Null`; values serde cannot walk
/// (typed arrays, class instances) go through `JSON.stringify`.
pub fn from_js(value: &JsValue) -> Value {
    if value.is_undefined() || value.is_null() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_wasm_bindgen::from_value::<Value>(value.clone()) {
        return parsed;
    }
    JSON::stringify(value)
        .ok()
        .map(String::from)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(Value::Null)
}

/// Readable text for a thrown JS value
pub fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// `Error` with `code` and `status`, the shape dApps test for
pub fn js_error(error: &BridgeError) -> JsValue {
    let err = js_sys::Error::new(&error.to_string());
    if let Some(code) = error.code() {
        let _ = Reflect::set(&err, &JsValue::from_str("code"), &JsValue::from_f64(code as f64));
    }
    let _ = Reflect::set(&err, &JsValue::from_str("status"), &JsValue::from_str(error.status().as_str()));
    err.into()
}
