//! Transport codec: the string envelope crossing the page/host boundary
//!
//! ```text
//! page → host   {"type":"column:request","id":1,"method":"connect","params":{..},"origin":"https://dapp"}
//!               {"type":"column:log","message":"..","data":{..}}
//! host → page   {"type":"column:response","id":1,"result":{..}}      | "error":"4001: User rejected"
//!               {"type":"column:event","event":"accountChange","data":{..}}
//! ```
//!
//! Encoding never fails. Integers outside the IEEE-754 safe range are
//! written as decimal strings because the host side parses JSON numbers
//! as doubles. Decoding never fails either: anything that is not one of
//! the inbound variants yields `None` and is dropped by the caller.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

/// Largest integer a double holds exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: u64 = (1u64 << 53) - 1;

/// Page → host
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "column:request")]
    Request {
        #[serde(deserialize_with = "flexible_id")]
        id: u64,
        method: String,
        #[serde(default)]
        params: Value,
        #[serde(default)]
        origin: String,
    },
    #[serde(rename = "column:log")]
    Log {
        message: String,
        #[serde(default)]
        data: Value,
    },
}

impl OutboundMessage {
    pub fn request(id: u64, method: impl Into<String>, params: Value, origin: impl Into<String>) -> Self {
        OutboundMessage::Request { id, method: method.into(), params, origin: origin.into() }
    }

    pub fn log(message: impl Into<String>, data: Value) -> Self {
        OutboundMessage::Log { message: message.into(), data }
    }

    fn to_value(&self) -> Value {
        match self {
            OutboundMessage::Request { id, method, params, origin } => json!({
                "type": "column:request",
                "id": id,
                "method": method,
                "params": params,
                "origin": origin,
            }),
            OutboundMessage::Log { message, data } => json!({
                "type": "column:log",
                "message": message,
                "data": data,
            }),
        }
    }
}

/// Host → page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "column:response")]
    Response {
        #[serde(deserialize_with = "flexible_id")]
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<Value>,
    },
    #[serde(rename = "column:event")]
    Event {
        event: String,
        #[serde(default)]
        data: Value,
    },
    /// Valid envelope with a `type` this protocol does not know
    #[serde(other)]
    Unrecognized,
}

impl InboundMessage {
    pub fn ok(id: u64, result: Value) -> Self {
        InboundMessage::Response { id, result, error: None }
    }

    pub fn err(id: u64, error: impl Into<String>) -> Self {
        InboundMessage::Response { id, result: Value::Null, error: Some(Value::String(error.into())) }
    }

    pub fn event(event: impl Into<String>, data: Value) -> Self {
        InboundMessage::Event { event: event.into(), data }
    }

    fn to_value(&self) -> Value {
        match self {
            InboundMessage::Response { id, result, error: Some(error) } => json!({
                "type": "column:response",
                "id": id,
                "result": result,
                "error": error,
            }),
            InboundMessage::Response { id, result, error: None } => json!({
                "type": "column:response",
                "id": id,
                "result": result,
            }),
            InboundMessage::Event { event, data } => json!({
                "type": "column:event",
                "event": event,
                "data": data,
            }),
            InboundMessage::Unrecognized => json!({}),
        }
    }
}

/// Flatten a host error payload into its message string.
///
/// Hosts send a string; some send `{ message, code }` objects instead.
pub fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let message = map.get("message").and_then(Value::as_str).unwrap_or("unknown error");
            match map.get("code").and_then(Value::as_i64) {
                Some(code) => format!("{}: {}", code, message),
                None => message.to_string(),
            }
        }
        other => other.to_string(),
    }
}

pub fn encode(message: &OutboundMessage) -> String {
    bignum_safe(message.to_value()).to_string()
}

pub fn decode(raw: &str) -> Option<InboundMessage> {
    match serde_json::from_str::<InboundMessage>(raw) {
        Ok(InboundMessage::Unrecognized) => {
            tracing::trace!("dropping foreign envelope");
            None
        }
        Ok(message) => Some(message),
        Err(_) => None,
    }
}

/// Host-side counterpart of `encode`, used by the CLI simulator and tests
pub fn encode_inbound(message: &InboundMessage) -> String {
    bignum_safe(message.to_value()).to_string()
}

/// Host-side counterpart of `decode`
pub fn decode_outbound(raw: &str) -> Option<OutboundMessage> {
    serde_json::from_str(raw).ok()
}

/// Replace integers outside ±(2^53 - 1) with their decimal string, recursively
pub fn bignum_safe(value: Value) -> Value {
    match value {
        Value::Number(n) => {
            let unsafe_int = match (n.as_u64(), n.as_i64()) {
                (Some(u), _) => u > MAX_SAFE_INTEGER,
                (None, Some(i)) => i.unsigned_abs() > MAX_SAFE_INTEGER,
                _ => false,
            };
            if unsafe_int {
                Value::String(n.to_string())
            } else {
                Value::Number(n)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(bignum_safe).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, bignum_safe(v))).collect()),
        other => other,
    }
}

fn flexible_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().ok_or_else(|| D::Error::custom("id must be a non-negative integer")),
        Value::String(s) => s.trim().parse::<u64>().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}
