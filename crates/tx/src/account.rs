//! Account addressing and multiplexed-account resolution.

use std::fmt;

use henyey_crypto::{decode_account_id, encode_account_id, encode_muxed_account};
use stellar_xdr::curr::{AccountId, MuxedAccount, MuxedAccountMed25519, PublicKey, Uint256};

use crate::Result;

/// A base account plus the optional sub-identifier of a multiplexed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountAddress {
    pub account_id: AccountId,
    pub muxed_id: Option<u64>,
}

impl AccountAddress {
    /// Resolves a multiplexed account to its base account and sub-id.
    pub fn from_muxed(muxed: &MuxedAccount) -> Self {
        match muxed {
            MuxedAccount::Ed25519(key) => Self::from_ed25519(key),
            MuxedAccount::MuxedEd25519(MuxedAccountMed25519 { id, ed25519 }) => Self {
                account_id: ed25519_account_id(ed25519),
                muxed_id: Some(*id),
            },
        }
    }

    pub fn from_ed25519(key: &Uint256) -> Self {
        Self {
            account_id: ed25519_account_id(key),
            muxed_id: None,
        }
    }

    pub fn from_account_id(account_id: AccountId) -> Self {
        Self {
            account_id,
            muxed_id: None,
        }
    }

    /// The base account as a G-address.
    pub fn address(&self) -> String {
        account_id_to_strkey(&self.account_id)
    }

    /// The M-address, present only for multiplexed accounts.
    pub fn muxed_address(&self) -> Option<String> {
        self.muxed_id
            .map(|id| encode_muxed_account(account_id_bytes(&self.account_id), id))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.muxed_address() {
            Some(m) => f.write_str(&m),
            None => f.write_str(&self.address()),
        }
    }
}

/// Strips the sub-identifier from a multiplexed account.
pub fn muxed_to_account_id(muxed: &MuxedAccount) -> AccountId {
    AccountAddress::from_muxed(muxed).account_id
}

pub fn account_id_to_strkey(account_id: &AccountId) -> String {
    encode_account_id(account_id_bytes(account_id))
}

/// Parses a G-address into an account id.
pub fn account_id_from_strkey(s: &str) -> Result<AccountId> {
    let key = decode_account_id(s)?;
    Ok(ed25519_account_id(&Uint256(key)))
}

fn ed25519_account_id(key: &Uint256) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(key.clone()))
}

fn account_id_bytes(account_id: &AccountId) -> &[u8; 32] {
    match &account_id.0 {
        PublicKey::PublicKeyTypeEd25519(Uint256(bytes)) => bytes,
    }
}
