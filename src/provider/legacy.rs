//! Legacy shims: the pre-AIP-62 `window.aptos` style API
//!
//! Older dApps expect bare values and thrown `{code: 4001}` errors instead
//! of `UserResponse`. Every shim delegates to the standard operation so
//! state lives in one place.

use serde_json::Value;

use super::types::{Account, UserResponse};
use super::wallet::WalletProvider;
use crate::error::{BridgeResult, HostError};
use crate::events::Listener;

const USER_REJECTED: &str = "User rejected the request";

fn bare(response: UserResponse<Value>) -> BridgeResult<Value> {
    response.args().ok_or_else(|| HostError::rejected(USER_REJECTED).into())
}

impl WalletProvider {
    pub async fn legacy_connect(&self) -> BridgeResult<Account> {
        self.connect(false, None)
            .await?
            .args()
            .ok_or_else(|| HostError::rejected(USER_REJECTED).into())
    }

    pub async fn legacy_disconnect(&self) {
        self.disconnect().await
    }

    pub async fn legacy_account(&self) -> BridgeResult<Account> {
        self.get_account()
            .await?
            .ok_or_else(|| HostError::unauthorized("No account connected").into())
    }

    /// Network name only, as `window.aptos.network()` returned it
    pub async fn legacy_network(&self) -> String {
        self.get_network().await.name
    }

    pub async fn legacy_sign_message(&self, input: Value) -> BridgeResult<Value> {
        bare(self.sign_message(input).await?)
    }

    pub async fn legacy_sign_and_submit_transaction(&self, input: Value) -> BridgeResult<Value> {
        bare(self.sign_and_submit_transaction(input).await?)
    }

    pub fn legacy_on_account_change(&self, listener: Listener) {
        self.on_account_change(listener)
    }

    pub fn legacy_on_network_change(&self, listener: Listener) {
        self.on_network_change(listener)
    }
}
