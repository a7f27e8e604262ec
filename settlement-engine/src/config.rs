//! Configuration for the settlement engine
//!
//! File/environment loading is for operators standing up an engine; all
//! values are re-validated by `GovernanceState::new` at initialization.

use crate::error::{ConfigError, Result};
use crate::governance::{GovernanceParams, DEFAULT_MAX_RECIPIENTS};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use transport_core::Address;

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account that may call admin and owner-only operations
    pub owner: String,

    /// Holding account the engine settles through
    pub engine_account: String,

    /// Governance parameters
    pub governance: GovernanceConfig,
}

/// Initial governance values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Service fee in basis points
    pub fee_bps: u16,

    /// Account receiving fees
    pub fee_recipient: String,

    /// Per-call recipient cap
    pub max_recipients: usize,

    /// Fee timelock delay in seconds
    pub min_fee_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            engine_account: "settlement-engine".to_string(),
            governance: GovernanceConfig::default(),
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            fee_bps: 10, // 0.10%
            fee_recipient: "treasury".to_string(),
            max_recipients: DEFAULT_MAX_RECIPIENTS,
            min_fee_delay_secs: 24 * 3600,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(owner) = std::env::var("SETTLE_OWNER") {
            config.owner = owner;
        }

        if let Ok(recipient) = std::env::var("SETTLE_FEE_RECIPIENT") {
            config.governance.fee_recipient = recipient;
        }

        if let Ok(bps) = std::env::var("SETTLE_FEE_BPS") {
            config.governance.fee_bps = bps
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("SETTLE_FEE_BPS: {}", e)))?;
        }

        if let Ok(max) = std::env::var("SETTLE_MAX_RECIPIENTS") {
            config.governance.max_recipients = max
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("SETTLE_MAX_RECIPIENTS: {}", e)))?;
        }

        Ok(config)
    }

    /// Owner address
    pub fn owner_address(&self) -> Address {
        Address::new(self.owner.clone())
    }

    /// Engine holding account address
    pub fn engine_address(&self) -> Address {
        Address::new(self.engine_account.clone())
    }

    /// Convert into validated-later governance parameters
    pub fn governance_params(&self) -> GovernanceParams {
        GovernanceParams {
            fee_bps: self.governance.fee_bps,
            fee_recipient: Address::new(self.governance.fee_recipient.clone()),
            max_recipients: self.governance.max_recipients,
            min_fee_delay: Duration::seconds(self.governance.min_fee_delay_secs as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let state = crate::governance::GovernanceState::new(config.governance_params());
        assert!(state.is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
owner = "ops"
engine_account = "engine-1"

[governance]
fee_bps = 25
fee_recipient = "fees"
max_recipients = 200
min_fee_delay_secs = 7200
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.owner, "ops");
        assert_eq!(config.governance.fee_bps, 25);
        assert_eq!(config.governance.max_recipients, 200);
        assert_eq!(
            config.governance_params().min_fee_delay,
            Duration::hours(2)
        );
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not toml at all [[[").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
