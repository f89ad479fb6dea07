//! Network identity.
//!
//! A transaction hash commits to the network it was signed for: the hashed
//! payload starts with the network id, which is `SHA256(passphrase)`. The
//! same envelope therefore has different hashes on testnet and mainnet, and
//! the ingestion pipeline must be configured with the right passphrase.
//!
//! ```rust
//! use henyey_common::NetworkId;
//!
//! assert_ne!(NetworkId::testnet(), NetworkId::mainnet());
//! ```

use crate::types::Hash256;

/// Passphrase of the public test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Passphrase of the public main network.
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Network identifier derived from a network passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkId(pub Hash256);

impl NetworkId {
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(Hash256::hash(passphrase.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn testnet() -> Self {
        Self::from_passphrase(TESTNET_PASSPHRASE)
    }

    pub fn mainnet() -> Self {
        Self::from_passphrase(MAINNET_PASSPHRASE)
    }
}

impl From<NetworkId> for stellar_xdr::curr::Hash {
    fn from(id: NetworkId) -> Self {
        stellar_xdr::curr::Hash(id.0 .0)
    }
}
