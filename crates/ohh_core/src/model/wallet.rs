use serde::{Deserialize, Serialize};
use std::fmt;

/// Address family of a manually entered wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    Ethereum,
    Solana,
}

impl WalletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WalletKind::Ethereum => "ethereum",
            WalletKind::Solana => "solana",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WalletKind,
    pub added_at: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Virtual machine family of a connected provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Evm,
    Svm,
}

/// Local mirror of the provider connection, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<ProviderKind>,
}
