//! Configuration types for henyey.
//!
//! Configuration is loaded from a TOML file. Every section is optional; a
//! missing section falls back to the testnet defaults.
//!
//! # Example Configuration (TOML)
//!
//! ```toml
//! [network]
//! passphrase = "Public Global Stellar Network ; September 2015"
//!
//! [ingest]
//! strict_ordering = true
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! # Loading Configuration
//!
//! ```rust,no_run
//! use henyey_common::Config;
//! use std::path::Path;
//!
//! let config = Config::from_file(Path::new("henyey.toml")).unwrap();
//! let network_id = config.network.network_id();
//! ```

use serde::{Deserialize, Serialize};

use crate::network::{NetworkId, MAINNET_PASSPHRASE, TESTNET_PASSPHRASE};

/// Log levels for filtering log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network identity used to compute transaction hashes.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Ledger ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Logging configuration (level and format).
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network passphrase that uniquely identifies the network.
    ///
    /// Standard values:
    /// - Testnet: `"Test SDF Network ; September 2015"`
    /// - Mainnet: `"Public Global Stellar Network ; September 2015"`
    #[serde(default = "default_passphrase")]
    pub passphrase: String,
}

impl NetworkConfig {
    pub fn network_id(&self) -> NetworkId {
        NetworkId::from_passphrase(&self.passphrase)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            passphrase: default_passphrase(),
        }
    }
}

/// Ledger ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Require each ledger to follow the previous one exactly.
    ///
    /// When false, any strictly increasing sequence is accepted, which lets
    /// a sparse extract of history be replayed. Default: true
    #[serde(default = "default_strict_ordering")]
    pub strict_ordering: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            strict_ordering: default_strict_ordering(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter. Default: `Info`
    #[serde(default)]
    pub level: LogLevel,

    /// Log output format. Default: `Text`
    #[serde(default)]
    pub format: LogFormat,
}

fn default_passphrase() -> String {
    TESTNET_PASSPHRASE.to_string()
}

fn default_strict_ordering() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        if config.network.passphrase.is_empty() {
            return Err(crate::Error::Config(
                "network passphrase cannot be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Default configuration for the public testnet.
    pub fn testnet() -> Self {
        Self::default()
    }

    /// Default configuration for the public mainnet.
    pub fn mainnet() -> Self {
        Self {
            network: NetworkConfig {
                passphrase: MAINNET_PASSPHRASE.to_string(),
            },
            ..Self::default()
        }
    }
}
