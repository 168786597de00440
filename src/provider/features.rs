//! Feature map: namespaced feature key → versioned operation set
//!
//! This is the extension point of the wallet object. The browser build
//! turns every descriptor into `{ version, <op>: function }` and routes the
//! call back through `WalletProvider::invoke` (or the subscription
//! helpers for `on*` operations).

use std::collections::BTreeMap;

use crate::core::names::feature;

/// Operations a feature can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    Account,
    Network,
    OnAccountChange,
    OnNetworkChange,
    SignMessage,
    SignTransaction,
    SignAndSubmitTransaction,
    ChangeNetwork,
    /// `standard:events.on(event, cb)`; returns a disposer
    On,
}

impl Operation {
    /// Method name on the page-facing descriptor
    pub fn js_name(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Account => "account",
            Operation::Network => "network",
            Operation::OnAccountChange => "onAccountChange",
            Operation::OnNetworkChange => "onNetworkChange",
            Operation::SignMessage => "signMessage",
            Operation::SignTransaction => "signTransaction",
            Operation::SignAndSubmitTransaction => "signAndSubmitTransaction",
            Operation::ChangeNetwork => "changeNetwork",
            Operation::On => "on",
        }
    }

    /// Takes a callback argument instead of plain values
    pub fn is_subscription(&self) -> bool {
        matches!(self, Operation::OnAccountChange | Operation::OnNetworkChange | Operation::On)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub version: String,
    pub operations: Vec<Operation>,
}

impl FeatureDescriptor {
    pub fn new(version: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self { version: version.into(), operations }
    }

    fn single(op: Operation) -> Self {
        Self::new(feature::VERSION, vec![op])
    }

    pub fn operation(&self, js_name: &str) -> Option<Operation> {
        self.operations.iter().copied().find(|op| op.js_name() == js_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    map: BTreeMap<String, FeatureDescriptor>,
}

impl Features {
    pub fn empty() -> Self {
        Self::default()
    }

    /// AIP-62 features plus `standard:events`
    pub fn standard() -> Self {
        let mut features = Self::empty();
        for (key, op) in [
            (feature::CONNECT, Operation::Connect),
            (feature::DISCONNECT, Operation::Disconnect),
            (feature::ACCOUNT, Operation::Account),
            (feature::NETWORK, Operation::Network),
            (feature::ON_ACCOUNT_CHANGE, Operation::OnAccountChange),
            (feature::ON_NETWORK_CHANGE, Operation::OnNetworkChange),
            (feature::SIGN_MESSAGE, Operation::SignMessage),
            (feature::SIGN_TRANSACTION, Operation::SignTransaction),
            (feature::SIGN_AND_SUBMIT, Operation::SignAndSubmitTransaction),
            (feature::CHANGE_NETWORK, Operation::ChangeNetwork),
            (feature::EVENTS, Operation::On),
        ] {
            features.insert(key, FeatureDescriptor::single(op));
        }
        features
    }

    /// Add or replace a feature
    pub fn insert(&mut self, key: impl Into<String>, descriptor: FeatureDescriptor) {
        self.map.insert(key.into(), descriptor);
    }

    pub fn get(&self, key: &str) -> Option<&FeatureDescriptor> {
        self.map.get(key)
    }

    /// Look up `features[key][js_name]`
    pub fn resolve(&self, key: &str, js_name: &str) -> Option<Operation> {
        self.get(key)?.operation(js_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureDescriptor)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
