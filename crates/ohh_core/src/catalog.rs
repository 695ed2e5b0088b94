//! Fixed chain and protocol lookups used by task records.

const CHAINS: &[(&str, &str)] = &[
    ("ethereum", "Ethereum"),
    ("polygon", "Polygon"),
    ("bsc", "BSC"),
    ("arbitrum", "Arbitrum"),
    ("optimism", "Optimism"),
    ("avalanche", "Avalanche"),
    ("fantom", "Fantom"),
    ("base", "Base"),
    ("solana", "Solana"),
    ("other", "Other"),
];

const PROTOCOLS: &[(&str, &str)] = &[
    ("uniswap", "Uniswap"),
    ("aave", "Aave"),
    ("curve", "Curve"),
    ("lido", "Lido"),
    ("opensea", "OpenSea"),
    ("compound", "Compound"),
    ("raydium", "Raydium"),
    ("magic-eden", "Magic Eden"),
    ("stake-pool", "Stake Pool"),
    ("other", "Other"),
];

fn lookup(table: &[(&str, &'static str)], id: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, name)| *name)
}

/// Display name for a chain id; unknown ids are shown as-is.
pub fn chain_name(id: &str) -> &str {
    lookup(CHAINS, id).unwrap_or(id)
}

/// Display name for a protocol id; unknown ids are shown as-is.
pub fn protocol_name(id: &str) -> &str {
    lookup(PROTOCOLS, id).unwrap_or(id)
}

pub fn is_known_chain(id: &str) -> bool {
    lookup(CHAINS, id).is_some()
}

pub fn is_known_protocol(id: &str) -> bool {
    lookup(PROTOCOLS, id).is_some()
}

pub fn chain_ids() -> impl Iterator<Item = &'static str> {
    CHAINS.iter().map(|(key, _)| *key)
}

pub fn protocol_ids() -> impl Iterator<Item = &'static str> {
    PROTOCOLS.iter().map(|(key, _)| *key)
}

#[cfg(test)]
mod tests {
    use super::{chain_ids, chain_name, is_known_chain, is_known_protocol, protocol_name};

    #[test]
    fn known_ids_resolve_to_display_names() {
        assert_eq!(chain_name("bsc"), "BSC");
        assert_eq!(protocol_name("magic-eden"), "Magic Eden");
    }

    #[test]
    fn unknown_ids_fall_back_to_raw_value() {
        assert_eq!(chain_name("zksync"), "zksync");
        assert_eq!(protocol_name(""), "");
        assert!(!is_known_chain("zksync"));
        assert!(!is_known_protocol("sushiswap"));
    }

    #[test]
    fn chain_ids_end_with_other() {
        assert_eq!(chain_ids().last(), Some("other"));
    }
}
