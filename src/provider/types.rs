//! Provider data model: accounts, networks, connection state, user responses

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// A connected account. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    #[serde(default, with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Account {
    pub fn new(address: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self { address: address.into(), public_key, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Host payloads are either the account itself or `{ account: {...} }`;
    /// null, `false` and address-less objects mean "no account". An
    /// address with an undecodable public key is an error.
    pub fn parse_host(value: &Value) -> Result<Option<Self>, serde_json::Error> {
        let candidate = match value.get("account") {
            Some(inner) if inner.is_object() => inner,
            _ => value,
        };
        let has_address = candidate
            .get("address")
            .and_then(Value::as_str)
            .is_some_and(|address| !address.is_empty());
        if !has_address {
            return Ok(None);
        }
        serde_json::from_value(candidate.clone()).map(Some)
    }

    /// Lenient form of `parse_host` for pushed events: anything unusable
    /// reads as "no account"
    pub fn from_host(value: &Value) -> Option<Self> {
        Self::parse_host(value).ok().flatten()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "address": self.address,
            "publicKey": hex_bytes::to_hex(&self.public_key),
            "name": self.name,
        })
    }
}

/// Public keys travel as `0x`-prefixed hex; byte arrays are accepted too.
mod hex_bytes {
    use super::*;

    pub fn to_hex(bytes: &[u8]) -> String {
        format!("0x{}", hex::encode(bytes))
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(bytes))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Hex(String),
        Bytes(Vec<u8>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        use serde::de::Error;

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(Repr::Bytes(bytes)) => Ok(bytes),
            Some(Repr::Hex(s)) => {
                let digits = s.strip_prefix("0x").unwrap_or(&s);
                hex::decode(digits).map_err(D::Error::custom)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".into(),
            chain_id: 1,
            url: Some("https://fullnode.mainnet.aptoslabs.com/v1".into()),
        }
    }

    /// Accepts a full descriptor or a bare network name
    pub fn from_host(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) if !name.is_empty() => {
                Some(Self { name: name.clone(), chain_id: 0, url: None })
            }
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Connection state. Handed out as clones only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub accounts: Vec<Account>,
}

impl ConnectionState {
    pub fn connected(account: Account) -> Self {
        Self { connected: true, accounts: vec![account] }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<&Account> {
        self.accounts.first()
    }

    pub fn accounts_value(&self) -> Value {
        Value::Array(self.accounts.iter().map(Account::to_value).collect())
    }
}

/// Outcome of a user-facing approval flow
#[derive(Debug, Clone, PartialEq)]
pub enum UserResponse<T> {
    Approved(T),
    Rejected,
}

impl<T> UserResponse<T> {
    pub fn is_approved(&self) -> bool {
        matches!(self, UserResponse::Approved(_))
    }

    pub fn args(self) -> Option<T> {
        match self {
            UserResponse::Approved(args) => Some(args),
            UserResponse::Rejected => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UserResponse<U> {
        match self {
            UserResponse::Approved(args) => UserResponse::Approved(f(args)),
            UserResponse::Rejected => UserResponse::Rejected,
        }
    }
}

impl<T: Serialize> UserResponse<T> {
    /// `{status:"Approved", args}` or `{status:"Rejected"}`
    pub fn to_value(&self) -> Value {
        match self {
            UserResponse::Approved(args) => json!({
                "status": "Approved",
                "args": serde_json::to_value(args).unwrap_or(Value::Null),
            }),
            UserResponse::Rejected => json!({ "status": "Rejected" }),
        }
    }
}
