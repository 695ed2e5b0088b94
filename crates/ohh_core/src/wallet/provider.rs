//! Pass-through wrapper around an injected wallet provider.
//!
//! The provider itself is external; this module only mirrors the connected
//! account locally, logs calls, and turns well-known error codes into
//! friendlier messages. Nothing here retries.

use crate::error::AppError;
use crate::model::{ProviderKind, WalletState};
use crate::storage::KeyValueStore;
use crate::task_store::TaskStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const USER_REJECTED: i64 = 4001;
pub const REQUEST_PENDING: i64 = -32002;
pub const UNKNOWN_CHAIN: i64 = 4902;
/// Local code for "no provider injected / no account connected".
pub const UNAVAILABLE: i64 = -1;

const WEI_PER_ETH: f64 = 1e18;
const ETH_DECIMALS: usize = 18;
const WEI_PER_GWEI: f64 = 1e9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new<M: Into<String>>(code: i64, message: M) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable<M: Into<String>>(message: M) -> Self {
        Self::new(UNAVAILABLE, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn friendly_message(&self) -> String {
        match self.code {
            USER_REJECTED => "request rejected in the wallet".to_string(),
            REQUEST_PENDING => "a wallet request is already pending, check your wallet".to_string(),
            UNKNOWN_CHAIN => "chain is not added to the wallet, add it first".to_string(),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub wei: String,
    pub eth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasPrice {
    pub wei: String,
    pub gwei: f64,
}

/// Host-supplied wallet capability. Quantities are `0x`-prefixed hex strings
/// exactly as the provider returns them.
pub trait WalletProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Evm
    }

    fn request_accounts(&mut self) -> Result<Vec<String>, ProviderError>;

    fn chain_id(&mut self) -> Result<String, ProviderError>;

    fn get_balance(&mut self, address: &str) -> Result<String, ProviderError>;

    fn send_transaction(&mut self, params: &TransactionParams) -> Result<String, ProviderError>;

    fn estimate_gas(&mut self, params: &TransactionParams) -> Result<String, ProviderError>;

    fn get_gas_price(&mut self) -> Result<String, ProviderError>;

    /// Nonce of `address` at the latest block.
    fn get_transaction_count(&mut self, address: &str) -> Result<String, ProviderError>;

    fn switch_chain(&mut self, chain_id: &str) -> Result<(), ProviderError>;

    fn add_chain(&mut self, params: &ChainParams) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Connect { chain_id: String },
    Disconnect,
}

pub fn parse_quantity(raw: &str) -> Result<u128, ProviderError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| ProviderError::new(UNAVAILABLE, format!("not a hex quantity: {raw}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|err| ProviderError::new(UNAVAILABLE, format!("bad hex quantity {raw}: {err}")))
}

/// Parses a decimal ETH amount such as `"0.05"` into wei without going
/// through floating point.
pub fn parse_ether(amount: &str) -> Result<u128, ProviderError> {
    let amount = amount.trim();
    let invalid = || ProviderError::unavailable(format!("not an ETH amount: {amount}"));

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > ETH_DECIMALS
    {
        return Err(invalid());
    }

    let scale = 10u128.pow(ETH_DECIMALS as u32);
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<width$}", width = ETH_DECIMALS)
            .parse()
            .map_err(|_| invalid())?
    };
    whole
        .checked_mul(scale)
        .and_then(|wei| wei.checked_add(fraction))
        .ok_or_else(invalid)
}

pub struct WalletSession<P> {
    provider: P,
    state: WalletState,
}

impl<P: WalletProvider> WalletSession<P> {
    /// Starts a session, restoring the mirrored connection from the store.
    pub fn resume<S: KeyValueStore>(provider: P, store: &TaskStore<S>) -> Self {
        Self {
            provider,
            state: store.wallet_state().clone(),
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn connect<S: KeyValueStore>(
        &mut self,
        store: &mut TaskStore<S>,
    ) -> Result<WalletState, AppError> {
        let accounts = self.provider.request_accounts().inspect_err(log_failure)?;
        let address = accounts
            .first()
            .cloned()
            .ok_or_else(|| ProviderError::unavailable("wallet returned no accounts"))?;
        let network = self.provider.chain_id().inspect_err(log_failure)?;

        info!(address = %address, network = %network, "wallet connected");
        let state = WalletState {
            connected: true,
            address: Some(address),
            network: Some(network),
            kind: Some(self.provider.kind()),
        };
        store.set_wallet_state(state.clone())?;
        self.state = state;
        if let Err(err) = store.record_wallet_connection() {
            warn!(%err, "wallet connection not counted");
        }
        Ok(self.state.clone())
    }

    pub fn disconnect<S: KeyValueStore>(&mut self, store: &mut TaskStore<S>) -> Result<(), AppError> {
        info!("wallet disconnected");
        self.state = WalletState::default();
        store.clear_wallet_state()
    }

    pub fn handle_event<S: KeyValueStore>(
        &mut self,
        event: ProviderEvent,
        store: &mut TaskStore<S>,
    ) -> Result<(), AppError> {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(address) => {
                    info!(address = %address, "accounts changed");
                    self.state.address = Some(address);
                    self.state.connected = true;
                    store.set_wallet_state(self.state.clone())
                }
                None => self.disconnect(store),
            },
            ProviderEvent::ChainChanged(chain_id) => {
                info!(chain_id = %chain_id, "chain changed");
                self.state.network = Some(chain_id);
                store.set_wallet_state(self.state.clone())
            }
            ProviderEvent::Connect { chain_id } => {
                info!(chain_id = %chain_id, "provider connected");
                self.state.connected = true;
                self.state.network = Some(chain_id);
                store.set_wallet_state(self.state.clone())
            }
            ProviderEvent::Disconnect => self.disconnect(store),
        }
    }

    pub fn get_balance(&mut self, address: &str) -> Result<Balance, ProviderError> {
        let wei = self.provider.get_balance(address).inspect_err(log_failure)?;
        let eth = parse_quantity(&wei)? as f64 / WEI_PER_ETH;
        info!(address, eth, "balance");
        Ok(Balance { wei, eth })
    }

    pub fn send_transaction(
        &mut self,
        params: TransactionParams,
    ) -> Result<String, ProviderError> {
        let from = self
            .state
            .address
            .clone()
            .filter(|_| self.state.connected)
            .ok_or_else(|| ProviderError::unavailable("no account connected, connect first"))?;
        let tx = TransactionParams {
            from: Some(from),
            ..params
        };
        info!(to = %tx.to, value = ?tx.value, "sending transaction");
        let hash = self.provider.send_transaction(&tx).inspect_err(log_failure)?;
        info!(hash = %hash, "transaction sent");
        Ok(hash)
    }

    /// Sends `amount` ETH (decimal, e.g. `"0.05"`) from the connected account.
    pub fn send_eth(&mut self, to: &str, amount: &str) -> Result<String, ProviderError> {
        let wei = parse_ether(amount)?;
        self.send_transaction(TransactionParams {
            to: to.to_string(),
            value: Some(format!("{wei:#x}")),
            ..TransactionParams::default()
        })
    }

    pub fn get_transaction_count(&mut self, address: &str) -> Result<u64, ProviderError> {
        let raw = self
            .provider
            .get_transaction_count(address)
            .inspect_err(log_failure)?;
        let nonce = u64::try_from(parse_quantity(&raw)?)
            .map_err(|_| ProviderError::unavailable(format!("nonce out of range: {raw}")))?;
        info!(address, nonce, "transaction count");
        Ok(nonce)
    }

    pub fn estimate_gas(&mut self, params: &TransactionParams) -> Result<u128, ProviderError> {
        let estimate = self.provider.estimate_gas(params).inspect_err(log_failure)?;
        let gas = parse_quantity(&estimate)?;
        info!(gas = %gas, "estimated gas");
        Ok(gas)
    }

    pub fn get_gas_price(&mut self) -> Result<GasPrice, ProviderError> {
        let wei = self.provider.get_gas_price().inspect_err(log_failure)?;
        let gwei = parse_quantity(&wei)? as f64 / WEI_PER_GWEI;
        info!(gwei, "gas price");
        Ok(GasPrice { wei, gwei })
    }

    pub fn switch_chain(&mut self, chain_id: &str) -> Result<(), ProviderError> {
        self.provider.switch_chain(chain_id).inspect_err(log_failure)?;
        info!(chain_id, "switched chain");
        Ok(())
    }

    pub fn add_chain(&mut self, params: &ChainParams) -> Result<(), ProviderError> {
        self.provider.add_chain(params).inspect_err(log_failure)?;
        info!(chain = %params.chain_name, "chain added");
        Ok(())
    }
}

fn log_failure(err: &ProviderError) {
    match err.code {
        USER_REJECTED | REQUEST_PENDING | UNKNOWN_CHAIN => {
            warn!(code = err.code, "{}", err.friendly_message())
        }
        _ => tracing::error!(code = err.code, message = %err.message, "wallet request failed"),
    }
}
