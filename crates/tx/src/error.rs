//! Error types for envelope resolution and transaction materialization.

use thiserror::Error;

/// Errors produced on the transaction read path.
#[derive(Debug, Error)]
pub enum TxError {
    /// The envelope could not be decoded or lacks a required field.
    ///
    /// During ingestion this aborts the enclosing ledger.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The lookup hash matches neither identity of the transaction.
    #[error("transaction identity not found: {0}")]
    IdentityNotFound(String),

    /// StrKey decoding or hashing failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] henyey_crypto::CryptoError),

    /// XDR encoding failed.
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}
