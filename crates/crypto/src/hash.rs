//! SHA-256 hashing utilities.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{Limits, WriteXdr};

use crate::{CryptoError, Hash256};

/// Compute the SHA-256 hash of `data`.
pub fn sha256(data: &[u8]) -> Hash256 {
    Hash256::hash(data)
}

/// Compute the SHA-256 hash of several chunks as if they were concatenated.
pub fn sha256_multi(chunks: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    Hash256(hasher.finalize().into())
}

/// Compute the SHA-256 hash of the XDR encoding of `value`.
///
/// Transaction hashes are defined this way.
pub fn xdr_sha256<T: WriteXdr>(value: &T) -> Result<Hash256, CryptoError> {
    let bytes = value.to_xdr(Limits::none())?;
    Ok(sha256(&bytes))
}
