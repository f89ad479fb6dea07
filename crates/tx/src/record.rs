//! The persisted transaction row.

use chrono::{DateTime, Utc};
use henyey_common::Toid;
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{TransactionResult, TransactionResultResult};

use crate::envelope::ResolvedEnvelope;
use crate::memo::{MemoType, MemoView};

/// A transaction as stored by the history service.
///
/// For fee-bumps, `transaction_hash`, `signatures` and `new_max_fee` belong to
/// the wrapper while `inner_transaction_hash`, `inner_signatures` and
/// `max_fee` belong to the wrapped transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_transaction_hash: Option<String>,
    pub ledger_sequence: u32,
    pub application_order: u32,
    pub toid: i64,
    pub ledger_close_time: DateTime<Utc>,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_muxed: Option<String>,
    pub account_sequence: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_account_muxed: Option<String>,
    pub max_fee: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_max_fee: Option<i64>,
    pub fee_charged: i64,
    pub operation_count: u32,
    pub envelope_xdr: String,
    pub result_xdr: String,
    pub memo_type: MemoType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub signatures: Vec<String>,
    #[serde(default)]
    pub inner_signatures: Vec<String>,
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_after: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_before: Option<u64>,
}

/// Where a transaction sits in history.
#[derive(Debug, Clone, Copy)]
pub struct RecordPosition {
    pub toid: Toid,
    pub ledger_close_time: DateTime<Utc>,
}

impl TransactionRecord {
    /// Builds the row for a resolved envelope and its result.
    pub fn new(
        resolved: &ResolvedEnvelope,
        result: &TransactionResult,
        position: RecordPosition,
        envelope_xdr: String,
        result_xdr: String,
    ) -> Self {
        let outer = resolved.outer();
        let tx = resolved.transaction_view();
        let memo = MemoView::from_memo(&tx.memo);
        let (valid_after, valid_before) = tx.validity_window();

        let (
            inner_transaction_hash,
            inner_signatures,
            fee_account,
            fee_account_muxed,
            new_max_fee,
        ) = match resolved.inner() {
            Some(inner) => (
                Some(inner.hash.to_hex()),
                inner.signature_strings(),
                Some(outer.fee_source.address()),
                outer.fee_source.muxed_address(),
                Some(outer.max_fee),
            ),
            None => (None, Vec::new(), None, None, None),
        };

        Self {
            transaction_hash: outer.hash.to_hex(),
            inner_transaction_hash,
            ledger_sequence: position.toid.ledger_sequence,
            application_order: position.toid.transaction_order,
            toid: position.toid.transaction().to_i64(),
            ledger_close_time: position.ledger_close_time,
            account: tx.source.address(),
            account_muxed: tx.source.muxed_address(),
            account_sequence: tx.sequence,
            fee_account,
            fee_account_muxed,
            max_fee: tx.max_fee,
            new_max_fee,
            fee_charged: result.fee_charged,
            operation_count: resolved.operations().len() as u32,
            envelope_xdr,
            result_xdr,
            memo_type: memo.memo_type,
            memo: memo.value,
            signatures: outer.signature_strings(),
            inner_signatures,
            successful: is_successful(result),
            valid_after,
            valid_before,
        }
    }
}

/// Whether the transaction (or the inner transaction of a fee-bump) applied.
pub fn is_successful(result: &TransactionResult) -> bool {
    matches!(
        result.result,
        TransactionResultResult::TxSuccess(_) | TransactionResultResult::TxFeeBumpInnerSuccess(_)
    )
}
