//! Network parameters and protocol limits

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Production network passphrase
pub const PUBLIC_NETWORK_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
/// Test network passphrase
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
/// Future network passphrase
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

pub const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";
pub const FUTURENET_RPC_URL: &str = "https://rpc-futurenet.stellar.org";

/// Minimum per-operation inclusion fee, in stroops
pub const BASE_FEE: u32 = 100;
/// Default transaction validity window, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default timeout for a single simulation request, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// `Operation operations<100>`
pub const MAX_OPERATIONS: usize = 100;
/// `DecoratedSignature signatures<20>`
pub const MAX_SIGNATURES: usize = 20;

/// A ledger network, identified by its passphrase
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Network {
    pub passphrase: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

impl Network {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: passphrase.to_string(),
            rpc_url: None,
        }
    }

    pub fn public() -> Self {
        Self::new(PUBLIC_NETWORK_PASSPHRASE)
    }

    pub fn testnet() -> Self {
        Self {
            passphrase: TESTNET_PASSPHRASE.to_string(),
            rpc_url: Some(TESTNET_RPC_URL.to_string()),
        }
    }

    pub fn futurenet() -> Self {
        Self {
            passphrase: FUTURENET_PASSPHRASE.to_string(),
            rpc_url: Some(FUTURENET_RPC_URL.to_string()),
        }
    }

    /// Network id: SHA-256 of the passphrase
    pub fn id(&self) -> [u8; 32] {
        network_id(&self.passphrase)
    }
}

pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Simulation endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl RpcConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids_differ() {
        assert_ne!(Network::public().id(), Network::testnet().id());
        assert_eq!(
            hex::encode(Network::testnet().id()),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn test_rpc_config_defaults() {
        let config: RpcConfig = serde_json::from_str(r#"{"url":"http://localhost:8000/rpc"}"#).unwrap();
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_network_from_json() {
        let network: Network =
            serde_json::from_str(r#"{"passphrase":"Standalone Network ; February 2017"}"#).unwrap();
        assert_eq!(network.rpc_url, None);
        assert_eq!(network.id(), network_id("Standalone Network ; February 2017"));
    }
}
