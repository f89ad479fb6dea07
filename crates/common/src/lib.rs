//! Common types and utilities for henyey.
//!
//! This crate provides the small set of types shared by every henyey crate:
//!
//! - [`Hash256`]: 32-byte SHA-256 hash used for transaction hashes and network ids
//! - [`NetworkId`]: network identity derived from the network passphrase
//! - [`Config`]: TOML configuration for the ingestion binary
//! - [`Toid`]: total-order ids used as resource ids and paging tokens
//! - [`Error`] / [`Result`]: the common error type

pub mod config;
pub mod error;
pub mod network;
pub mod toid;
pub mod types;

pub use config::{Config, IngestConfig, LogFormat, LogLevel, LoggingConfig, NetworkConfig};
pub use error::{Error, Result};
pub use network::NetworkId;
pub use toid::Toid;
pub use types::Hash256;

/// Re-export stellar-xdr for convenience
pub use stellar_xdr;
