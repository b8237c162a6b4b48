//! Algorand network configuration and name normalization.
//!
//! Two networks are supported: mainnet and testnet, identified by CAIP-2
//! strings whose reference part is the network's genesis hash. V1 legacy
//! names (`algorand-mainnet`, `algorand-testnet`) normalize to CAIP-2.
//! The bare name `"algorand"` is not accepted — callers must name the
//! network explicitly.

use crate::constants::{
    ALGORAND_MAINNET_CAIP2, ALGORAND_TESTNET_CAIP2, MAINNET_ALGOD_URL, MAINNET_GENESIS_HASH,
    MAINNET_GENESIS_ID, MAINNET_INDEXER_URL, TESTNET_ALGOD_URL, TESTNET_GENESIS_HASH,
    TESTNET_GENESIS_ID, TESTNET_INDEXER_URL, USDC_MAINNET_ASA_ID, USDC_TESTNET_ASA_ID,
    V1_ALGORAND_MAINNET, V1_ALGORAND_TESTNET,
};

/// Static configuration for one Algorand network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// CAIP-2 identifier (`algorand:<genesis_hash>`).
    pub caip2: &'static str,
    /// V1 legacy network name.
    pub v1_name: &'static str,
    /// Base64-encoded genesis hash.
    pub genesis_hash: &'static str,
    /// Genesis id string (e.g., `"testnet-v1.0"`).
    pub genesis_id: &'static str,
    /// Default Algod endpoint.
    pub algod_url: &'static str,
    /// Default Indexer endpoint.
    pub indexer_url: &'static str,
    /// Environment variable overriding the Algod endpoint.
    pub algod_url_env: &'static str,
    /// Environment variable overriding the Indexer endpoint.
    pub indexer_url_env: &'static str,
    /// USDC ASA id on this network.
    pub usdc_asa_id: u64,
}

/// All supported Algorand networks.
pub const NETWORKS: &[NetworkConfig] = &[
    NetworkConfig {
        caip2: ALGORAND_MAINNET_CAIP2,
        v1_name: V1_ALGORAND_MAINNET,
        genesis_hash: MAINNET_GENESIS_HASH,
        genesis_id: MAINNET_GENESIS_ID,
        algod_url: MAINNET_ALGOD_URL,
        indexer_url: MAINNET_INDEXER_URL,
        algod_url_env: "ALGOD_MAINNET_URL",
        indexer_url_env: "INDEXER_MAINNET_URL",
        usdc_asa_id: USDC_MAINNET_ASA_ID,
    },
    NetworkConfig {
        caip2: ALGORAND_TESTNET_CAIP2,
        v1_name: V1_ALGORAND_TESTNET,
        genesis_hash: TESTNET_GENESIS_HASH,
        genesis_id: TESTNET_GENESIS_ID,
        algod_url: TESTNET_ALGOD_URL,
        indexer_url: TESTNET_INDEXER_URL,
        algod_url_env: "ALGOD_TESTNET_URL",
        indexer_url_env: "INDEXER_TESTNET_URL",
        usdc_asa_id: USDC_TESTNET_ASA_ID,
    },
];

/// Error raised for unknown or unsupported network identifiers.
#[derive(Debug, thiserror::Error)]
#[error("unsupported Algorand network: {0}")]
pub struct UnsupportedNetworkError(pub String);

impl NetworkConfig {
    /// Resolves the Algod endpoint, honoring the environment override.
    #[must_use]
    pub fn algod_endpoint(&self) -> String {
        std::env::var(self.algod_url_env).unwrap_or_else(|_| self.algod_url.to_owned())
    }

    /// Resolves the Indexer endpoint, honoring the environment override.
    #[must_use]
    pub fn indexer_endpoint(&self) -> String {
        std::env::var(self.indexer_url_env).unwrap_or_else(|_| self.indexer_url.to_owned())
    }
}

/// Normalizes a network identifier to its CAIP-2 form.
///
/// Accepts full CAIP-2 identifiers and V1 legacy names. The bare `"algorand"`
/// shorthand is rejected; an implicit mainnet default is too easy to pay the
/// wrong network with.
///
/// # Errors
///
/// Returns [`UnsupportedNetworkError`] for anything else.
pub fn normalize_network(network: &str) -> Result<&'static str, UnsupportedNetworkError> {
    network_config(network).map(|config| config.caip2)
}

/// Looks up the configuration for a network identifier (CAIP-2 or V1 name).
///
/// # Errors
///
/// Returns [`UnsupportedNetworkError`] if the network is unknown.
pub fn network_config(network: &str) -> Result<&'static NetworkConfig, UnsupportedNetworkError> {
    NETWORKS
        .iter()
        .find(|config| config.caip2 == network || config.v1_name == network)
        .ok_or_else(|| UnsupportedNetworkError(network.to_owned()))
}

/// Returns `true` if the identifier names a supported network.
#[must_use]
pub fn is_valid_network(network: &str) -> bool {
    network_config(network).is_ok()
}

/// Returns the genesis hash bound to a network.
///
/// # Errors
///
/// Returns [`UnsupportedNetworkError`] if the network is unknown.
pub fn genesis_hash(network: &str) -> Result<&'static str, UnsupportedNetworkError> {
    network_config(network).map(|config| config.genesis_hash)
}

/// Returns the USDC ASA id for a network.
///
/// # Errors
///
/// Returns [`UnsupportedNetworkError`] if the network is unknown.
pub fn usdc_asa_id(network: &str) -> Result<u64, UnsupportedNetworkError> {
    network_config(network).map(|config| config.usdc_asa_id)
}

/// Determines the CAIP-2 network that owns a genesis hash, if any.
#[must_use]
pub fn network_from_genesis_hash(genesis_hash: &str) -> Option<&'static str> {
    NETWORKS
        .iter()
        .find(|config| config.genesis_hash == genesis_hash)
        .map(|config| config.caip2)
}

/// Maps a CAIP-2 identifier back to its V1 legacy name, if known.
#[must_use]
pub fn v1_name(caip2: &str) -> Option<&'static str> {
    NETWORKS
        .iter()
        .find(|config| config.caip2 == caip2)
        .map(|config| config.v1_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caip2_identifiers_normalize_to_themselves() {
        assert_eq!(
            normalize_network(ALGORAND_MAINNET_CAIP2).unwrap(),
            ALGORAND_MAINNET_CAIP2
        );
        assert_eq!(
            normalize_network(ALGORAND_TESTNET_CAIP2).unwrap(),
            ALGORAND_TESTNET_CAIP2
        );
    }

    #[test]
    fn v1_names_normalize_to_caip2() {
        assert_eq!(
            normalize_network("algorand-mainnet").unwrap(),
            ALGORAND_MAINNET_CAIP2
        );
        assert_eq!(
            normalize_network("algorand-testnet").unwrap(),
            ALGORAND_TESTNET_CAIP2
        );
    }

    #[test]
    fn bare_algorand_shorthand_is_rejected() {
        assert!(normalize_network("algorand").is_err());
    }

    #[test]
    fn unknown_networks_are_rejected() {
        assert!(normalize_network("algorand:bogus").is_err());
        assert!(normalize_network("eip155:1").is_err());
        assert!(!is_valid_network(""));
    }

    #[test]
    fn genesis_hash_roundtrip() {
        let hash = genesis_hash(ALGORAND_TESTNET_CAIP2).unwrap();
        assert_eq!(network_from_genesis_hash(hash), Some(ALGORAND_TESTNET_CAIP2));
        assert_eq!(network_from_genesis_hash("AAAA"), None);
    }

    #[test]
    fn usdc_ids_per_network() {
        assert_eq!(usdc_asa_id("algorand-mainnet").unwrap(), 31_566_704);
        assert_eq!(usdc_asa_id(ALGORAND_TESTNET_CAIP2).unwrap(), 10_458_941);
    }

    #[test]
    fn v1_name_reverse_lookup() {
        assert_eq!(v1_name(ALGORAND_MAINNET_CAIP2), Some("algorand-mainnet"));
        assert_eq!(v1_name("algorand:bogus"), None);
    }
}
