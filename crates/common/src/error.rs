//! Common error types for henyey.
//!
//! This module provides the unified error type [`enum@Error`] and the convenience
//! type alias [`Result`] used by the shared crates.
//!
//! # Example
//!
//! ```rust
//! use henyey_common::{Error, Result};
//!
//! fn validate_passphrase(passphrase: &str) -> Result<()> {
//!     if passphrase.is_empty() {
//!         return Err(Error::Config("network passphrase cannot be empty".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for henyey operations.
#[derive(Error, Debug)]
pub enum Error {
    /// XDR encoding/decoding error.
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    /// I/O error.
    ///
    /// Wraps standard I/O errors from reading configuration or input files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    ///
    /// Occurs when configuration is invalid or cannot be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}
