//! TOML file configuration structures.
//!
//! These structs directly map to the `spool-config.toml` file format.

use serde::{Deserialize, Serialize};
use spool_core::amount::DEFAULT_VALUE_SCALE;
use spool_core::config::InvariantPolicy;
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub accounting: AccountingConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Chain access section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint. Must serve historical `eth_call`.
    pub rpc_url: Url,
    /// Share-token contract; doubles as the pool id.
    pub share_token: String,
    /// Underlying asset held by the share-token contract.
    pub staked_token: String,
    #[serde(default)]
    pub start_block: u64,
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_confirmations() -> u64 {
    12
}

fn default_batch_size() -> u64 {
    2000
}

fn default_poll_interval_secs() -> u64 {
    12
}

/// Accounting section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingConfig {
    #[serde(default = "default_value_scale")]
    pub value_scale: u32,
    #[serde(default)]
    pub invariant_policy: InvariantPolicy,
    /// Mint/burn counterparty. Defaults to the zero address.
    #[serde(default)]
    pub sentinel: Option<String>,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            value_scale: default_value_scale(),
            invariant_policy: InvariantPolicy::default(),
            sentinel: None,
        }
    }
}

fn default_value_scale() -> u32 {
    DEFAULT_VALUE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[chain]
rpc_url = "http://localhost:8545"
share_token = "0x00000000000000000000000000000000000000B0"
staked_token = "0x00000000000000000000000000000000000000a5"
start_block = 19000000
confirmations = 3
batch_size = 500
poll_interval_secs = 4

[accounting]
value_scale = 6
invariant_policy = "strict"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.chain.start_block, 19_000_000);
        assert_eq!(config.chain.confirmations, 3);
        assert_eq!(config.chain.batch_size, 500);
        assert_eq!(config.chain.poll_interval_secs, 4);
        assert_eq!(config.accounting.value_scale, 6);
        assert_eq!(config.accounting.invariant_policy, InvariantPolicy::Strict);
        assert!(config.accounting.sentinel.is_none());
    }

    #[test]
    fn test_defaults() {
        let toml_str = r#"
[chain]
rpc_url = "http://localhost:8545"
share_token = "0x00000000000000000000000000000000000000b0"
staked_token = "0x00000000000000000000000000000000000000a5"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.chain.start_block, 0);
        assert_eq!(config.chain.confirmations, 12);
        assert_eq!(config.chain.batch_size, 2000);
        assert_eq!(config.chain.poll_interval_secs, 12);
        assert_eq!(config.accounting.value_scale, 18);
        assert_eq!(config.accounting.invariant_policy, InvariantPolicy::Clamp);
    }

    #[test]
    fn test_missing_chain_section_is_rejected() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let toml_str = r#"
[chain]
rpc_url = "http://localhost:8545"
share_token = "0x00000000000000000000000000000000000000b0"
staked_token = "0x00000000000000000000000000000000000000a5"

[accounting]
invariant_policy = "ignore"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
