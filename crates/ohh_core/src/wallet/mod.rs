use crate::error::AppError;
use crate::model::WalletKind;
use regex::Regex;
use std::sync::LazyLock;

pub mod provider;

static ETHEREUM_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid ethereum regex"));
static SOLANA_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{44}$").expect("valid solana regex")
});

/// Classifies a manually entered address by shape alone; no checksum.
pub fn classify_address(address: &str) -> Result<WalletKind, AppError> {
    let trimmed = address.trim();
    if ETHEREUM_ADDRESS.is_match(trimmed) {
        Ok(WalletKind::Ethereum)
    } else if SOLANA_ADDRESS.is_match(trimmed) {
        Ok(WalletKind::Solana)
    } else {
        Err(AppError::invalid_input(
            "address must be a 0x-prefixed 40 hex digit or 44 character base58 address",
        ))
    }
}

pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
