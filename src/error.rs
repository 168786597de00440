//! Error types for the bridge
//!
//! Hard failures surface as `BridgeError`. User declines are not errors:
//! they resolve as `UserResponse::Rejected` (see `provider::types`).

use serde::Serialize;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure of an RPC round trip
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The send primitive is missing or threw (bridge not ready)
    #[error("bridge unavailable: {0}")]
    TransportUnavailable(String),
    /// The host answered with an error string
    #[error(transparent)]
    Host(#[from] HostError),
    /// The pending entry was torn down without an answer
    #[error("request {0} dropped before a response arrived")]
    Dropped(u64),
    /// The host answered with a payload this side cannot interpret
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The page called an operation with arguments it cannot take
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl BridgeError {
    /// Numeric code in the EIP-1193 / wallet-adapter family, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            BridgeError::Host(e) => e.code,
            BridgeError::TransportUnavailable(_) => Some(4900),
            _ => None,
        }
    }

    pub fn status(&self) -> HostStatus {
        match self {
            BridgeError::Host(e) => e.status,
            BridgeError::TransportUnavailable(_) => HostStatus::Disconnected,
            _ => HostStatus::Failed,
        }
    }

    /// True when the host reported that the user declined
    pub fn is_rejection(&self) -> bool {
        self.status() == HostStatus::Rejected
    }
}

/// Coarse label derived from a host error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HostStatus {
    Rejected,
    Unauthorized,
    Unsupported,
    Disconnected,
    Failed,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Rejected => "Rejected",
            HostStatus::Unauthorized => "Unauthorized",
            HostStatus::Unsupported => "Unsupported",
            HostStatus::Disconnected => "Disconnected",
            HostStatus::Failed => "Failed",
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            4001 => Some(HostStatus::Rejected),
            4100 => Some(HostStatus::Unauthorized),
            4200 => Some(HostStatus::Unsupported),
            4900 | 4901 => Some(HostStatus::Disconnected),
            _ => None,
        }
    }
}

/// Typed form of the host's error string
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct HostError {
    pub code: Option<i64>,
    pub status: HostStatus,
    pub message: String,
}

impl HostError {
    pub fn new(code: Option<i64>, status: HostStatus, message: impl Into<String>) -> Self {
        Self { code, status, message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(Some(4001), HostStatus::Rejected, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Some(4100), HostStatus::Unauthorized, message)
    }

    /// Parse `"4001: User rejected"`, `"4001 User rejected"` or a bare message.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();

        let (code, message) = if digits > 0 {
            let rest = &trimmed[digits..];
            let code = trimmed[..digits].parse::<i64>().ok();
            match rest.chars().next() {
                None => (code, trimmed),
                Some(':') | Some(' ') => (code, rest[1..].trim_start()),
                Some(_) => (None, trimmed),
            }
        } else {
            (None, trimmed)
        };

        let status = code
            .and_then(HostStatus::from_code)
            .unwrap_or_else(|| status_from_message(message));
        let message = if message.is_empty() { status.as_str() } else { message };

        Self { code, status, message: message.to_string() }
    }
}

fn status_from_message(message: &str) -> HostStatus {
    let lower = message.to_ascii_lowercase();
    if ["reject", "denied", "declin", "cancel"].iter().any(|w| lower.contains(w)) {
        HostStatus::Rejected
    } else if lower.contains("unauthori") || lower.contains("not connected") {
        HostStatus::Unauthorized
    } else if lower.contains("unsupported") || lower.contains("not supported") {
        HostStatus::Unsupported
    } else {
        HostStatus::Failed
    }
}

/// The send primitive failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport: {0}")]
pub struct TransportError(pub String);

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        BridgeError::TransportUnavailable(e.0)
    }
}

/// A page-side compatibility path failed (dispatch, global assignment, listener, timer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("dispatch '{event}' failed: {reason}")]
    Dispatch { event: String, reason: String },
    #[error("assign global '{name}' failed: {reason}")]
    AssignGlobal { name: String, reason: String },
    #[error("listen '{event}' failed: {reason}")]
    Listen { event: String, reason: String },
    #[error("schedule '{task}' after {delay_ms}ms failed: {reason}")]
    Schedule { task: String, delay_ms: u32, reason: String },
    #[error("handshake callback failed: {0}")]
    Handshake(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}
