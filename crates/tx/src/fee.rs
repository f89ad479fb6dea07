//! Fee accounting across the two identities of a fee-bump pair.
//!
//! A plain transaction has one identity whose declared fee is its max fee and
//! whose charged amount comes from the result. A fee-bump has two:
//!
//! | identity | `max_fee` | `fee_charged` |
//! |----------|-----------|---------------|
//! | outer (wrapper) | fee-bump fee | total deducted from the fee source |
//! | inner | inner declared fee `F` | `F` |
//!
//! All functions here are pure.

use serde::Serialize;

use crate::record::TransactionRecord;

/// Declared and charged fee of one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeView {
    pub max_fee: i64,
    pub fee_charged: i64,
}

/// Fee views of a transaction's identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFees {
    pub outer: FeeView,
    pub inner: Option<FeeView>,
}

impl TransactionFees {
    pub fn plain(max_fee: i64, fee_charged: i64) -> Self {
        Self {
            outer: FeeView {
                max_fee,
                fee_charged,
            },
            inner: None,
        }
    }

    pub fn fee_bump(inner_max_fee: i64, outer_max_fee: i64, fee_charged: i64) -> Self {
        Self {
            outer: FeeView {
                max_fee: outer_max_fee,
                fee_charged,
            },
            inner: Some(FeeView {
                max_fee: inner_max_fee,
                fee_charged: inner_max_fee,
            }),
        }
    }

    /// Rebuilds the fee views from a persisted row.
    ///
    /// Rows store the inner declared fee in `max_fee` and the wrapper's fee in
    /// `new_max_fee`.
    pub fn from_record(record: &TransactionRecord) -> Self {
        match record.new_max_fee {
            Some(outer_max_fee) => {
                Self::fee_bump(record.max_fee, outer_max_fee, record.fee_charged)
            }
            None => Self::plain(record.max_fee, record.fee_charged),
        }
    }

    pub fn is_fee_bump(&self) -> bool {
        self.inner.is_some()
    }

    /// Extra fee the wrapper declares on top of the inner declared fee.
    pub fn fee_bump_delta(&self) -> Option<i64> {
        self.inner
            .map(|inner| self.outer.max_fee.saturating_sub(inner.max_fee))
    }
}

/// One independently addressable identity of a transaction.
///
/// The outer identity of a fee-bump carries its inner identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIdentity {
    pub hash: String,
    pub fee: FeeView,
    pub signatures: Vec<String>,
    pub is_fee_bump: bool,
    pub inner: Option<Box<TransactionIdentity>>,
}

impl TransactionIdentity {
    /// Builds the outer identity (and nested inner identity) of a row.
    pub fn from_record(record: &TransactionRecord) -> Self {
        let fees = TransactionFees::from_record(record);
        let inner = match (&record.inner_transaction_hash, fees.inner) {
            (Some(hash), Some(fee)) => Some(Box::new(TransactionIdentity {
                hash: hash.clone(),
                fee,
                signatures: record.inner_signatures.clone(),
                is_fee_bump: false,
                inner: None,
            })),
            _ => None,
        };
        TransactionIdentity {
            hash: record.transaction_hash.clone(),
            fee: fees.outer,
            signatures: record.signatures.clone(),
            is_fee_bump: inner.is_some(),
            inner,
        }
    }

    /// Finds the identity addressed by `hash` (hex, case-insensitive).
    pub fn find(&self, hash: &str) -> Option<&TransactionIdentity> {
        if self.hash.eq_ignore_ascii_case(hash) {
            return Some(self);
        }
        self.inner.as_deref().and_then(|inner| inner.find(hash))
    }
}
