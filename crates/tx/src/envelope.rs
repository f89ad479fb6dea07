//! Envelope resolution.
//!
//! A [`TransactionEnvelope`] comes in three shapes: legacy V0, V1, and a
//! fee-bump wrapper around a V1 transaction. [`ResolvedEnvelope`] normalizes
//! all three into [`EnvelopeView`]s, one per addressable identity:
//!
//! - a plain transaction has a single view;
//! - a fee-bump transaction has an outer view (fee-bump hash, signatures and
//!   fee) and an inner view (the wrapped transaction's own hash, signatures
//!   and fee). Both views share the inner source, memo, sequence number and
//!   operation list.
//!
//! # Example
//!
//! ```ignore
//! use henyey_common::NetworkId;
//! use henyey_tx::ResolvedEnvelope;
//!
//! let resolved = ResolvedEnvelope::from_base64(envelope_xdr, &NetworkId::testnet())?;
//! for op in resolved.operations() {
//!     let source = resolved.outer().operation_source(op);
//! }
//! ```

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use henyey_common::{Hash256, NetworkId};
use henyey_crypto::xdr_sha256;
use stellar_xdr::curr::{
    DecoratedSignature, FeeBumpTransactionInnerTx, Hash, Limits, Memo, MuxedAccount, Operation,
    Preconditions, ReadXdr, TimeBounds, Transaction, TransactionEnvelope, TransactionExt,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction, TransactionV0,
};

use crate::account::AccountAddress;
use crate::memo::MemoView;
use crate::{Result, TxError};

/// Which envelope variant a view was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    V0,
    V1,
    FeeBump,
}

/// Uniform view of one transaction identity.
#[derive(Debug, Clone)]
pub struct EnvelopeView {
    pub kind: EnvelopeKind,
    pub hash: Hash256,
    pub source: AccountAddress,
    pub fee_source: AccountAddress,
    pub memo: Memo,
    pub signatures: Vec<DecoratedSignature>,
    pub sequence: i64,
    /// Declared fee of this identity.
    pub max_fee: i64,
    pub operations: Arc<[Operation]>,
    pub time_bounds: Option<TimeBounds>,
}

impl EnvelopeView {
    pub fn is_fee_bump(&self) -> bool {
        self.kind == EnvelopeKind::FeeBump
    }

    pub fn memo_view(&self) -> MemoView {
        MemoView::from_memo(&self.memo)
    }

    /// Signatures as Horizon shows them: base64 of the signature bytes.
    pub fn signature_strings(&self) -> Vec<String> {
        signature_strings(&self.signatures)
    }

    /// The account an operation acts for: its own source, else the transaction source.
    pub fn operation_source(&self, op: &Operation) -> AccountAddress {
        op.source_account
            .as_ref()
            .map(AccountAddress::from_muxed)
            .unwrap_or_else(|| self.source.clone())
    }

    /// `(valid_after, valid_before)` in unix seconds; an unbounded upper
    /// limit is reported as absent.
    pub fn validity_window(&self) -> (Option<u64>, Option<u64>) {
        match &self.time_bounds {
            None => (None, None),
            Some(tb) => (
                Some(tb.min_time.0),
                (tb.max_time.0 != 0).then_some(tb.max_time.0),
            ),
        }
    }
}

/// An envelope resolved into its outer view and, for fee-bumps, its inner view.
#[derive(Debug, Clone)]
pub struct ResolvedEnvelope {
    outer: EnvelopeView,
    inner: Option<EnvelopeView>,
}

impl ResolvedEnvelope {
    /// Resolves a decoded envelope, computing identity hashes for `network_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::MalformedEnvelope`] if the transaction has no operations.
    pub fn resolve(envelope: &TransactionEnvelope, network_id: &NetworkId) -> Result<Self> {
        let resolved = match envelope {
            TransactionEnvelope::TxV0(env) => {
                let tx = v0_to_v1(&env.tx);
                Self {
                    outer: plain_view(EnvelopeKind::V0, &tx, &env.signatures, network_id)?,
                    inner: None,
                }
            }
            TransactionEnvelope::Tx(env) => Self {
                outer: plain_view(EnvelopeKind::V1, &env.tx, &env.signatures, network_id)?,
                inner: None,
            },
            TransactionEnvelope::TxFeeBump(env) => {
                let FeeBumpTransactionInnerTx::Tx(inner_env) = &env.tx.inner_tx;
                let inner = plain_view(
                    EnvelopeKind::V1,
                    &inner_env.tx,
                    &inner_env.signatures,
                    network_id,
                )?;
                let hash = signature_payload_hash(
                    network_id,
                    TransactionSignaturePayloadTaggedTransaction::TxFeeBump(env.tx.clone()),
                )?;
                let outer = EnvelopeView {
                    kind: EnvelopeKind::FeeBump,
                    hash,
                    source: inner.source.clone(),
                    fee_source: AccountAddress::from_muxed(&env.tx.fee_source),
                    memo: inner.memo.clone(),
                    signatures: env.signatures.to_vec(),
                    sequence: inner.sequence,
                    max_fee: env.tx.fee,
                    operations: Arc::clone(&inner.operations),
                    time_bounds: inner.time_bounds.clone(),
                };
                Self {
                    outer,
                    inner: Some(inner),
                }
            }
        };
        if resolved.outer.operations.is_empty() {
            return Err(TxError::MalformedEnvelope(format!(
                "transaction {} has no operations",
                resolved.outer.hash
            )));
        }
        Ok(resolved)
    }

    /// Decodes base64 XDR and resolves it.
    pub fn from_base64(envelope_xdr: &str, network_id: &NetworkId) -> Result<Self> {
        Self::resolve(&decode_envelope(envelope_xdr)?, network_id)
    }

    /// The outer identity: the fee-bump wrapper, or the only identity.
    pub fn outer(&self) -> &EnvelopeView {
        &self.outer
    }

    /// The wrapped transaction of a fee-bump.
    pub fn inner(&self) -> Option<&EnvelopeView> {
        self.inner.as_ref()
    }

    /// The identity whose own fields describe the executed transaction.
    pub fn transaction_view(&self) -> &EnvelopeView {
        self.inner.as_ref().unwrap_or(&self.outer)
    }

    pub fn is_fee_bump(&self) -> bool {
        self.inner.is_some()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.outer.operations
    }

    /// Finds the identity addressed by `hash`.
    pub fn view_for(&self, hash: &Hash256) -> Option<&EnvelopeView> {
        if self.outer.hash == *hash {
            return Some(&self.outer);
        }
        self.inner.as_ref().filter(|inner| inner.hash == *hash)
    }
}

/// Decodes a base64 envelope, mapping any failure to [`TxError::MalformedEnvelope`].
pub fn decode_envelope(envelope_xdr: &str) -> Result<TransactionEnvelope> {
    TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none())
        .map_err(|e| TxError::MalformedEnvelope(format!("undecodable envelope: {}", e)))
}

/// The memo of an envelope without requiring the rest of it to be well formed.
pub fn envelope_memo(envelope: &TransactionEnvelope) -> &Memo {
    match envelope {
        TransactionEnvelope::TxV0(env) => &env.tx.memo,
        TransactionEnvelope::Tx(env) => &env.tx.memo,
        TransactionEnvelope::TxFeeBump(env) => {
            let FeeBumpTransactionInnerTx::Tx(inner) = &env.tx.inner_tx;
            &inner.tx.memo
        }
    }
}

pub fn signature_strings(signatures: &[DecoratedSignature]) -> Vec<String> {
    signatures
        .iter()
        .map(|sig| STANDARD.encode(sig.signature.0.as_slice()))
        .collect()
}

fn plain_view(
    kind: EnvelopeKind,
    tx: &Transaction,
    signatures: &[DecoratedSignature],
    network_id: &NetworkId,
) -> Result<EnvelopeView> {
    let hash = signature_payload_hash(
        network_id,
        TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    )?;
    let source = AccountAddress::from_muxed(&tx.source_account);
    Ok(EnvelopeView {
        kind,
        hash,
        fee_source: source.clone(),
        source,
        memo: tx.memo.clone(),
        signatures: signatures.to_vec(),
        sequence: tx.seq_num.0,
        max_fee: i64::from(tx.fee),
        operations: tx.operations.to_vec().into(),
        time_bounds: time_bounds(&tx.cond),
    })
}

fn signature_payload_hash(
    network_id: &NetworkId,
    tagged_transaction: TransactionSignaturePayloadTaggedTransaction,
) -> Result<Hash256> {
    let payload = TransactionSignaturePayload {
        network_id: Hash::from(*network_id),
        tagged_transaction,
    };
    Ok(xdr_sha256(&payload)?)
}

/// V0 transactions hash as the equivalent V1 transaction.
fn v0_to_v1(v0: &TransactionV0) -> Transaction {
    Transaction {
        source_account: MuxedAccount::Ed25519(v0.source_account_ed25519.clone()),
        fee: v0.fee,
        seq_num: v0.seq_num.clone(),
        cond: match &v0.time_bounds {
            Some(tb) => Preconditions::Time(tb.clone()),
            None => Preconditions::None,
        },
        memo: v0.memo.clone(),
        operations: v0.operations.clone(),
        ext: TransactionExt::V0,
    }
}

fn time_bounds(cond: &Preconditions) -> Option<TimeBounds> {
    match cond {
        Preconditions::None => None,
        Preconditions::Time(tb) => Some(tb.clone()),
        Preconditions::V2(v2) => v2.time_bounds.clone(),
    }
}
