//! Cryptographic error types.

use thiserror::Error;

/// Errors produced while decoding keys or hashing XDR values.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// StrKey decoding failed (bad base32, wrong version byte, bad checksum).
    #[error("invalid strkey encoding: {0}")]
    InvalidStrKey(String),

    /// Data length does not match the expected size.
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// XDR serialization failed.
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}
