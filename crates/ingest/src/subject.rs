//! Sponsorship subjects: the reserve-consuming ledger entries a sponsorship
//! can be attached to.

use std::fmt;

use henyey_common::Hash256;
use henyey_crypto::signer_key_to_strkey;
use henyey_tx::{account_id_to_strkey, trustline_asset_to_string};
use serde::Serialize;
use stellar_xdr::curr::{
    AccountId, ClaimableBalanceId, LedgerKey, RevokeSponsorshipOp, RevokeSponsorshipOpSigner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Account,
    Signer,
    Trustline,
    Offer,
    Data,
    ClaimableBalance,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Account => "account",
            SubjectKind::Signer => "signer",
            SubjectKind::Trustline => "trustline",
            SubjectKind::Offer => "offer",
            SubjectKind::Data => "data",
            SubjectKind::ClaimableBalance => "claimable_balance",
        }
    }
}

/// Identity of a reserve-consuming entry.
///
/// Signer keys, trustline assets and claimable balance ids are held in their
/// rendered string form so that keys built from operations and from revoke
/// ledger keys compare equal. Data names keep their raw bytes, since distinct
/// names may not be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SponsorshipSubject {
    Account(AccountId),
    Signer { account: AccountId, signer: String },
    Trustline { account: AccountId, asset: String },
    Offer { seller: AccountId, offer_id: i64 },
    Data { account: AccountId, name: Vec<u8> },
    ClaimableBalance(String),
}

impl SponsorshipSubject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            SponsorshipSubject::Account(_) => SubjectKind::Account,
            SponsorshipSubject::Signer { .. } => SubjectKind::Signer,
            SponsorshipSubject::Trustline { .. } => SubjectKind::Trustline,
            SponsorshipSubject::Offer { .. } => SubjectKind::Offer,
            SponsorshipSubject::Data { .. } => SubjectKind::Data,
            SponsorshipSubject::ClaimableBalance(_) => SubjectKind::ClaimableBalance,
        }
    }

    /// The account named by the key. Claimable balances name none; their
    /// owner is only known from state.
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            SponsorshipSubject::Account(account)
            | SponsorshipSubject::Signer { account, .. }
            | SponsorshipSubject::Trustline { account, .. }
            | SponsorshipSubject::Data { account, .. } => Some(account),
            SponsorshipSubject::Offer { seller, .. } => Some(seller),
            SponsorshipSubject::ClaimableBalance(_) => None,
        }
    }

    pub fn claimable_balance(id: &ClaimableBalanceId) -> Self {
        SponsorshipSubject::ClaimableBalance(claimable_balance_id_string(id))
    }

    pub fn data(account: AccountId, name: &[u8]) -> Self {
        SponsorshipSubject::Data {
            account,
            name: name.to_vec(),
        }
    }

    /// The subject a revoke operation names, if it is one we track.
    pub fn from_revoke(op: &RevokeSponsorshipOp) -> Option<Self> {
        match op {
            RevokeSponsorshipOp::LedgerEntry(key) => Self::from_ledger_key(key),
            RevokeSponsorshipOp::Signer(RevokeSponsorshipOpSigner {
                account_id,
                signer_key,
            }) => Some(SponsorshipSubject::Signer {
                account: account_id.clone(),
                signer: signer_key_to_strkey(signer_key),
            }),
        }
    }

    pub fn from_ledger_key(key: &LedgerKey) -> Option<Self> {
        match key {
            LedgerKey::Account(k) => Some(SponsorshipSubject::Account(k.account_id.clone())),
            LedgerKey::Trustline(k) => Some(SponsorshipSubject::Trustline {
                account: k.account_id.clone(),
                asset: trustline_asset_to_string(&k.asset),
            }),
            LedgerKey::Offer(k) => Some(SponsorshipSubject::Offer {
                seller: k.seller_id.clone(),
                offer_id: k.offer_id,
            }),
            LedgerKey::Data(k) => Some(Self::data(k.account_id.clone(), k.data_name.as_vec())),
            LedgerKey::ClaimableBalance(k) => Some(Self::claimable_balance(&k.balance_id)),
            _ => None,
        }
    }
}

impl fmt::Display for SponsorshipSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SponsorshipSubject::Account(account) => {
                write!(f, "account:{}", account_id_to_strkey(account))
            }
            SponsorshipSubject::Signer { account, signer } => {
                write!(f, "signer:{}:{}", account_id_to_strkey(account), signer)
            }
            SponsorshipSubject::Trustline { account, asset } => {
                write!(f, "trustline:{}:{}", account_id_to_strkey(account), asset)
            }
            SponsorshipSubject::Offer { seller, offer_id } => {
                write!(f, "offer:{}:{}", account_id_to_strkey(seller), offer_id)
            }
            SponsorshipSubject::Data { account, name } => {
                let name = String::from_utf8_lossy(name);
                write!(f, "data:{}:{}", account_id_to_strkey(account), name)
            }
            SponsorshipSubject::ClaimableBalance(id) => write!(f, "claimable_balance:{}", id),
        }
    }
}

/// Claimable balance ids render as the hex of their XDR: a four-byte type tag
/// followed by the hash.
pub fn claimable_balance_id_string(id: &ClaimableBalanceId) -> String {
    match id {
        ClaimableBalanceId::ClaimableBalanceIdTypeV0(hash) => {
            format!("00000000{}", Hash256::from(hash.clone()).to_hex())
        }
    }
}
