//! Hashing and StrKey encoding for henyey.
//!
//! The history service never signs or verifies anything; it only needs to
//! hash XDR values (transaction hashes, claimable balance ids) and render
//! keys the way Horizon clients expect to see them.
//!
//! - **SHA-256 hashing**: [`sha256`], [`sha256_multi`] and [`xdr_sha256`]
//! - **StrKey encoding**: account ids (G), muxed accounts (M), pre-auth
//!   transactions (T), hash-x signers (X) and signed payloads (P)
//! - **Signer keys**: [`signer_key_to_strkey`] renders any [`SignerKey`]
//!
//! # Example
//!
//! ```
//! use henyey_crypto::{decode_account_id, encode_account_id, sha256};
//!
//! let strkey = encode_account_id(&[0u8; 32]);
//! assert_eq!(decode_account_id(&strkey).unwrap(), [0u8; 32]);
//!
//! let hash = sha256(b"stellar");
//! ```
//!
//! [`SignerKey`]: stellar_xdr::curr::SignerKey

mod error;
mod hash;
mod signer_key;
mod strkey;

pub use error::CryptoError;
pub use hash::*;
pub use signer_key::*;
pub use strkey::*;

pub use henyey_common::Hash256;
