//! Configuration module for spool-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables, and turns it into the validated
//! `spool_core::config` types.

pub mod file;

use crate::config::file::FileConfig;
use spool_core::address::Address;
use spool_core::amount::MAX_VALUE_SCALE;
use spool_core::config::{AccountingConfig, ChainConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub chain: ChainConfig,
    pub accounting: AccountingConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read, override, validate and convert the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        build_loaded_config(file_config)
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    Address::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{field} {value:?}: {e}")))
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let FileConfig {
        server,
        chain,
        accounting,
    } = file_config;

    if chain.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "chain.batch_size must be greater than zero".to_string(),
        ));
    }
    if chain.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "chain.poll_interval_secs must be greater than zero".to_string(),
        ));
    }
    if accounting.value_scale > MAX_VALUE_SCALE {
        return Err(ConfigError::ValidationError(format!(
            "accounting.value_scale {} exceeds {MAX_VALUE_SCALE}",
            accounting.value_scale
        )));
    }

    let share_token = parse_address("chain.share_token", &chain.share_token)?;
    let staked_token = parse_address("chain.staked_token", &chain.staked_token)?;
    let mut accounting_config = AccountingConfig::new(share_token.clone())
        .with_value_scale(accounting.value_scale)
        .with_invariant_policy(accounting.invariant_policy);
    if let Some(sentinel) = &accounting.sentinel {
        accounting_config.sentinel = parse_address("accounting.sentinel", sentinel)?;
    }

    Ok(LoadedConfig {
        listen: server.listen,
        chain: ChainConfig {
            rpc_url: chain.rpc_url,
            share_token,
            staked_token,
            start_block: chain.start_block,
            confirmations: chain.confirmations,
            batch_size: chain.batch_size,
            poll_interval: Duration::from_secs(chain.poll_interval_secs),
        },
        accounting: accounting_config,
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_core::config::InvariantPolicy;

    const VALID: &str = r#"
[chain]
rpc_url = "http://localhost:8545"
share_token = "0x00000000000000000000000000000000000000B0"
staked_token = "0x00000000000000000000000000000000000000a5"
"#;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("unused.toml", None)
    }

    #[test]
    fn test_load_normalizes_addresses() {
        let config = loader().load_str(VALID).unwrap();
        assert_eq!(
            config.chain.share_token.as_str(),
            "0x00000000000000000000000000000000000000b0"
        );
        assert_eq!(config.accounting.pool_id, config.chain.share_token);
        assert!(config.accounting.sentinel.is_zero());
        assert_eq!(config.accounting.invariant_policy, InvariantPolicy::Clamp);
        assert_eq!(config.chain.poll_interval, Duration::from_secs(12));
    }

    #[test]
    fn test_listen_override() {
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let config = ConfigLoader::new("unused.toml", Some(listen))
            .load_str(VALID)
            .unwrap();
        assert_eq!(config.listen, listen);
    }

    #[test]
    fn test_rejects_bad_address() {
        let content = VALID.replace("000000a5\"", "\"");
        assert!(matches!(
            loader().load_str(&content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let content = format!("{VALID}batch_size = 0\n");
        assert!(matches!(
            loader().load_str(&content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_large_value_scale() {
        let content = format!("{VALID}\n[accounting]\nvalue_scale = 29\n");
        assert!(matches!(
            loader().load_str(&content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_custom_sentinel() {
        let content = format!(
            "{VALID}\n[accounting]\nsentinel = \"0x000000000000000000000000000000000000dEaD\"\n"
        );
        let config = loader().load_str(&content).unwrap();
        assert_eq!(
            config.accounting.sentinel.as_str(),
            "0x000000000000000000000000000000000000dead"
        );
    }

    #[test]
    fn test_missing_file() {
        let loader = ConfigLoader::new("/nonexistent/spool-config.toml", None);
        assert!(matches!(loader.load(), Err(ConfigError::IoError(_))));
    }
}
