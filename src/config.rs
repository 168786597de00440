//! Bridge configuration - supplied by the host when it injects the bridge

use serde::{Deserialize, Serialize};

use crate::core::names::discovery;
use crate::error::ConfigError;
use crate::provider::Network;

const DEFAULT_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHZpZXdCb3g9IjAgMCAzMiAzMiI+PHJlY3Qgd2lkdGg9IjMyIiBoZWlnaHQ9IjMyIiByeD0iOCIgZmlsbD0iIzExMSIvPjxyZWN0IHg9IjEzIiB5PSI3IiB3aWR0aD0iNiIgaGVpZ2h0PSIxOCIgcng9IjMiIGZpbGw9IiNmZmYiLz48L3N2Zz4=";

/// Display metadata carried by the wallet object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletInfo {
    pub name: String,
    pub url: String,
    pub version: String,
    pub icon: String,
    pub chains: Vec<String>,
}

impl Default for WalletInfo {
    fn default() -> Self {
        Self {
            name: "Column".into(),
            url: "https://column.app".into(),
            version: "1.0.0".into(),
            icon: DEFAULT_ICON.into(),
            chains: vec!["aptos:mainnet".into(), "aptos:testnet".into(), "aptos:devnet".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub wallet: WalletInfo,
    /// Globals that alias the wallet object (`window.column`, ...)
    pub global_names: Vec<String>,
    /// Boolean `isX` flags set on the wallet object
    pub identity_flags: Vec<String>,
    /// Legacy "initialized" events dispatched after injection
    pub legacy_events: Vec<String>,
    /// Re-announce delays after the immediate dispatch
    pub announce_delays_ms: Vec<u32>,
    /// Returned by getNetwork when the host cannot answer
    pub default_network: Network,
    /// Overrides the page origin sent with each request
    pub origin: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wallet: WalletInfo::default(),
            global_names: strings(discovery::GLOBAL_NAMES),
            identity_flags: strings(discovery::IDENTITY_FLAGS),
            legacy_events: strings(discovery::LEGACY_INITIALIZED),
            announce_delays_ms: discovery::ANNOUNCE_DELAYS_MS.to_vec(),
            default_network: Network::mainnet(),
            origin: None,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BridgeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.wallet.name = name.into();
        config
    }

    pub fn with_wallet(mut self, wallet: WalletInfo) -> Self { self.wallet = wallet; self }
    pub fn with_global_names(mut self, names: Vec<String>) -> Self { self.global_names = names; self }
    pub fn with_identity_flags(mut self, flags: Vec<String>) -> Self { self.identity_flags = flags; self }
    pub fn with_legacy_events(mut self, events: Vec<String>) -> Self { self.legacy_events = events; self }
    pub fn with_announce_delays(mut self, delays_ms: Vec<u32>) -> Self { self.announce_delays_ms = delays_ms; self }
    pub fn with_default_network(mut self, network: Network) -> Self { self.default_network = network; self }
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self { self.origin = Some(origin.into()); self }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.name.trim().is_empty() {
            return Err(ConfigError::Invalid("wallet.name is empty".into()));
        }
        if self.wallet.chains.is_empty() {
            return Err(ConfigError::Invalid("wallet.chains is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_compat_path() {
        let config = BridgeConfig::default();
        assert_eq!(config.global_names, vec!["column", "aptos", "petra"]);
        assert_eq!(config.legacy_events.len(), 2);
        assert_eq!(config.announce_delays_ms, vec![0, 100, 500, 1500]);
        assert!(config.wallet.icon.starts_with("data:image/svg+xml;base64,"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = BridgeConfig::from_json(r#"{"wallet":{"name":"Acme"},"announceDelaysMs":[10]}"#).unwrap();
        assert_eq!(config.wallet.name, "Acme");
        assert_eq!(config.wallet.chains.len(), 3);
        assert_eq!(config.announce_delays_ms, vec![10]);
        assert_eq!(config.default_network, Network::mainnet());
    }

    #[test]
    fn rejects_invalid() {
        assert!(BridgeConfig::from_json(r#"{"wallet":{"name":" "}}"#).is_err());
        assert!(BridgeConfig::from_json(r#"{"wallet":{"chains":[]}}"#).is_err());
        assert!(BridgeConfig::from_json("nope").is_err());
    }

    #[test]
    fn builder() {
        let config = BridgeConfig::new("Test").with_origin("https://x").with_announce_delays(vec![]);
        assert_eq!(config.wallet.name, "Test");
        assert_eq!(config.origin.as_deref(), Some("https://x"));
        assert!(config.announce_delays_ms.is_empty());
    }
}
