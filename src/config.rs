use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use sublink_interface::common::AddressType;
use sublink_rpc::{PoolConfig, RetryConfig};

/// The chain dialect, which decides the bundled type definitions and the
/// metadata handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Stafi,
    Polkadot,
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainType::Stafi => write!(f, "stafi"),
            ChainType::Polkadot => write!(f, "polkadot"),
        }
    }
}

/// Mortality of signed transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EraConfig {
    Immortal,
    /// Valid for the given number of blocks.
    Mortal(u64),
}

impl Default for EraConfig {
    fn default() -> Self {
        EraConfig::Immortal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Websocket endpoint of the node, `ws://` or `wss://`.
    pub endpoint: String,
    pub chain: ChainType,
    pub address_type: AddressType,
    /// Additional type definitions, registered on top of the bundled ones.
    pub types_path: Option<PathBuf>,
    pub ss58_format: u16,
    pub pool: PoolConfig,
    pub retry: RetryConfig,
    pub era: EraConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: "ws://127.0.0.1:9944".to_string(),
            chain: ChainType::Polkadot,
            address_type: AddressType::MultiAddress,
            types_path: None,
            ss58_format: 42,
            pool: PoolConfig::default(),
            retry: RetryConfig::default(),
            era: EraConfig::Immortal,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: &str, chain: ChainType) -> Self {
        ClientConfig {
            endpoint: endpoint.to_string(),
            chain,
            address_type: match chain {
                ChainType::Stafi => AddressType::AccountId,
                ChainType::Polkadot => AddressType::MultiAddress,
            },
            ..Default::default()
        }
    }
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| Error::Config(format!("failed to parse configuration: {}", err)))?;

        config.validate()?;
        Ok(config)
    }
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            Error::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;

        Self::from_json(&content)
    }
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "endpoint must be a websocket url: {}",
                self.endpoint
            )));
        }

        self.pool
            .validate()
            .map_err(|err| Error::Config(err.to_string()))?;

        if self.retry.max_attempts == 0 {
            return Err(Error::Config("at least one attempt is required".to_string()));
        }

        if let EraConfig::Mortal(period) = self.era {
            if !(4..=1 << 16).contains(&period) {
                return Err(Error::Config(format!(
                    "mortal period must be between 4 and 65536, got {}",
                    period
                )));
            }
        }

        Ok(())
    }
}
