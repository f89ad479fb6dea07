//! Transaction resources.
//!
//! [`materialize`] turns a persisted [`TransactionRecord`] into the resource
//! served to API clients. A fee-bump row is addressable by two hashes; the
//! lookup hash picks which identity is presented at the top level (hash, id,
//! signatures and links), while both identities stay visible as the nested
//! `inner_transaction` and `fee_bump_transaction` objects.
//!
//! Materialization is pure: it reads only its arguments.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use henyey_crypto::decode_muxed_account;
use serde::Serialize;
use stellar_xdr::curr::Memo;
use tracing::debug;

use crate::envelope::{decode_envelope, envelope_memo};
use crate::fee::{FeeView, TransactionIdentity};
use crate::memo::{MemoType, MemoView};
use crate::record::TransactionRecord;
use crate::{Result, TxError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: String) -> Self {
        Self { href }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub account: Link,
    pub ledger: Link,
    pub operations: Link,
    pub effects: Link,
    pub transaction: Link,
}

/// One identity of a fee-bump pair, nested under the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedTransaction {
    pub hash: String,
    pub signatures: Vec<String>,
    pub max_fee: i64,
    pub fee_charged: i64,
}

impl NestedTransaction {
    fn from_identity(identity: &TransactionIdentity) -> Self {
        Self {
            hash: identity.hash.clone(),
            signatures: identity.signatures.clone(),
            max_fee: identity.fee.max_fee,
            fee_charged: identity.fee.fee_charged,
        }
    }
}

/// The externally visible transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResource {
    #[serde(rename = "_links")]
    pub links: TransactionLinks,
    pub id: String,
    pub paging_token: String,
    pub successful: bool,
    pub hash: String,
    pub ledger: u32,
    pub created_at: String,
    pub source_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_muxed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_muxed_id: Option<String>,
    pub source_account_sequence: String,
    pub fee_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_account_muxed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_account_muxed_id: Option<String>,
    pub fee_charged: i64,
    pub max_fee: i64,
    pub operation_count: u32,
    pub envelope_xdr: String,
    pub result_xdr: String,
    pub memo_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_bytes: Option<String>,
    pub signatures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bump_transaction: Option<NestedTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_transaction: Option<NestedTransaction>,
}

/// Materializes `record` as seen through `lookup_hash`.
///
/// # Errors
///
/// - [`TxError::IdentityNotFound`] if `lookup_hash` is neither the outer nor
///   the inner hash of the row.
/// - [`TxError::MalformedEnvelope`] if a text memo's raw bytes cannot be
///   recovered from the stored envelope.
pub fn materialize(lookup_hash: &str, record: &TransactionRecord) -> Result<TransactionResource> {
    build(lookup_hash, record, true)
}

/// Like [`materialize`], but leaves out every multiplexed-address field.
pub fn materialize_without_muxed(
    lookup_hash: &str,
    record: &TransactionRecord,
) -> Result<TransactionResource> {
    build(lookup_hash, record, false)
}

fn build(
    lookup_hash: &str,
    record: &TransactionRecord,
    with_muxed: bool,
) -> Result<TransactionResource> {
    let identity = TransactionIdentity::from_record(record);
    let presented = identity.find(lookup_hash).ok_or_else(|| {
        debug!(
            lookup_hash,
            transaction_hash = %record.transaction_hash,
            "Lookup hash matches no identity"
        );
        TxError::IdentityNotFound(lookup_hash.to_string())
    })?;

    let (fee_bump_transaction, inner_transaction) = match &identity.inner {
        Some(inner) => (
            Some(NestedTransaction::from_identity(&identity)),
            Some(NestedTransaction::from_identity(inner)),
        ),
        None => (None, None),
    };

    let (account_muxed, account_muxed_id, fee_account_muxed, fee_account_muxed_id) = if with_muxed
    {
        (
            record.account_muxed.clone(),
            muxed_id(record.account_muxed.as_deref())?,
            record.fee_account_muxed.clone(),
            muxed_id(record.fee_account_muxed.as_deref())?,
        )
    } else {
        (None, None, None, None)
    };

    let hash = presented.hash.clone();
    let FeeView {
        max_fee,
        fee_charged,
    } = identity.fee;

    Ok(TransactionResource {
        links: TransactionLinks {
            self_link: Link::new(format!("/transactions/{}", hash)),
            account: Link::new(format!("/accounts/{}", record.account)),
            ledger: Link::new(format!("/ledgers/{}", record.ledger_sequence)),
            operations: Link::new(format!("/transactions/{}/operations", hash)),
            effects: Link::new(format!("/transactions/{}/effects", hash)),
            transaction: Link::new(format!("/transactions/{}", hash)),
        },
        id: hash.clone(),
        paging_token: record.toid.to_string(),
        successful: record.successful,
        hash,
        ledger: record.ledger_sequence,
        created_at: record
            .ledger_close_time
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        source_account: record.account.clone(),
        account_muxed,
        account_muxed_id,
        source_account_sequence: record.account_sequence.to_string(),
        fee_account: record
            .fee_account
            .clone()
            .unwrap_or_else(|| record.account.clone()),
        fee_account_muxed,
        fee_account_muxed_id,
        fee_charged,
        max_fee,
        operation_count: record.operation_count,
        envelope_xdr: record.envelope_xdr.clone(),
        result_xdr: record.result_xdr.clone(),
        memo_type: record.memo_type.as_str().to_string(),
        memo: record.memo.clone(),
        memo_bytes: memo_bytes(record)?,
        signatures: presented.signatures.clone(),
        valid_after: record.valid_after.and_then(timestamp),
        valid_before: record.valid_before.and_then(timestamp),
        fee_bump_transaction,
        inner_transaction,
    })
}

/// Raw text-memo bytes recovered from the stored envelope.
fn memo_bytes(record: &TransactionRecord) -> Result<Option<String>> {
    if record.memo_type != MemoType::Text || record.envelope_xdr.is_empty() {
        return Ok(None);
    }
    let envelope = decode_envelope(&record.envelope_xdr)?;
    match envelope_memo(&envelope) {
        Memo::Text(text) => Ok(Some(STANDARD.encode(text.as_vec()))),
        other => Err(TxError::MalformedEnvelope(format!(
            "row has a text memo but the envelope memo is {}",
            MemoView::from_memo(other).memo_type.as_str()
        ))),
    }
}

fn muxed_id(address: Option<&str>) -> Result<Option<String>> {
    address
        .map(|m| Ok(decode_muxed_account(m)?.1.to_string()))
        .transpose()
}

fn timestamp(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}
