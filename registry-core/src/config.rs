//! Configuration for the registry

use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Administrator identity; fixed for the lifetime of the registry
    pub owner: Address,

    /// Ledger settlement account payments hop through
    pub settlement_account: Address,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// Event broadcast channel capacity
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "registry-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            owner: Address::new("registry-admin"),
            settlement_account: Address::new("registry-settlement"),
            mailbox_capacity: 1000,
            event_channel_capacity: 1024,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(owner) = std::env::var("REGISTRY_OWNER") {
            config.owner = Address::new(owner);
        }

        if let Ok(account) = std::env::var("REGISTRY_SETTLEMENT_ACCOUNT") {
            config.settlement_account = Address::new(account);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "registry-core");
        assert_eq!(config.owner, Address::new("registry-admin"));
        assert!(config.mailbox_capacity > 0);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            service_name = "registry-core"
            service_version = "0.1.0"
            owner = "0xADMIN"
            settlement_account = "0xLEDGER"
            mailbox_capacity = 64
            event_channel_capacity = 128
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.owner, Address::new("0xADMIN"));
        assert_eq!(config.mailbox_capacity, 64);
    }
}
