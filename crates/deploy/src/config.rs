//! Process-wide deployment configuration.

use std::path::PathBuf;
use std::time::Duration;

use alloy_core::primitives::{Address, B256, keccak256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::events::ContractRole;

/// Fixed gas ceiling for standalone deployment transactions.
pub const DEPLOYMENT_GAS_CEILING: u64 = 3_000_000;

/// Null-address sentinel used when no default receiver address is configured.
pub const NULL_ADDRESS: Address = Address::ZERO;

/// Event a profile contract emits for every contract it creates on behalf of
/// its owner; the created address is its second indexed parameter.
const CONTRACT_CREATED_SIGNATURE: &str = "ContractCreated(uint256,address,uint256,bytes32)";

/// The default name for the deployment configuration file.
pub const UPCONF_FILENAME: &str = "Upfactory.toml";

/// Immutable constants consumed by one deployment run.
///
/// Injected into the factory and provider rather than hard-coded so the
/// pipelines can run against mock chains in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Gas ceiling for standalone deployment transactions.
    pub gas_ceiling: u64,
    /// Sentinel probed when no default receiver address is configured.
    pub null_address: Address,
    /// Initialize signature of the account proxy.
    pub account_initialize_signature: String,
    /// Initialize signature of the key manager proxy.
    pub key_manager_initialize_signature: String,
    /// Initialize signature of the universal receiver delegate proxy.
    pub universal_receiver_initialize_signature: String,
    /// Topic of the log a profile contract emits for contracts it creates.
    pub contract_created_topic: B256,
    /// Interval between receipt polling attempts, in milliseconds.
    pub receipt_poll_interval_ms: u64,
    /// Receipt deadline in seconds; `None` waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_timeout_secs: Option<u64>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            gas_ceiling: DEPLOYMENT_GAS_CEILING,
            null_address: NULL_ADDRESS,
            account_initialize_signature: "initialize(address)".to_string(),
            key_manager_initialize_signature: "initialize(address)".to_string(),
            universal_receiver_initialize_signature: "initialize()".to_string(),
            contract_created_topic: keccak256(CONTRACT_CREATED_SIGNATURE.as_bytes()),
            receipt_poll_interval_ms: 2_000,
            receipt_timeout_secs: Some(120),
        }
    }
}

impl DeployConfig {
    /// Initialize signature for a proxy of the given role.
    pub fn initialize_signature(&self, role: ContractRole) -> &str {
        match role {
            ContractRole::Account => &self.account_initialize_signature,
            ContractRole::KeyManager => &self.key_manager_initialize_signature,
            ContractRole::UniversalReceiverDelegate => &self.universal_receiver_initialize_signature,
        }
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Option<Duration> {
        self.receipt_timeout_secs.map(Duration::from_secs)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file or directory not found: {}",
                path.display()
            ));
        }

        let config_path = if path.is_dir() {
            path.join(UPCONF_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(config_path)
            .context(format!("Failed to read config from {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.gas_ceiling, 3_000_000);
        assert_eq!(config.null_address, Address::ZERO);
        assert_eq!(config.account_initialize_signature, "initialize(address)");
        assert_eq!(config.receipt_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_initialize_signature_per_role() {
        let config = DeployConfig::default();
        assert_eq!(
            config.initialize_signature(ContractRole::Account),
            "initialize(address)"
        );
        assert_eq!(
            config.initialize_signature(ContractRole::KeyManager),
            "initialize(address)"
        );
        // The receiver delegate proxy takes no initialization arguments.
        assert_eq!(
            config.initialize_signature(ContractRole::UniversalReceiverDelegate),
            "initialize()"
        );
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = DeployConfig::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: DeployConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_contract_created_topic_is_stable() {
        let config = DeployConfig::default();
        assert_eq!(
            config.contract_created_topic,
            keccak256(b"ContractCreated(uint256,address,uint256,bytes32)")
        );
    }
}
