//! Transaction read path for the henyey history service.
//!
//! This crate turns transaction envelopes into the values clients see:
//!
//! - [`ResolvedEnvelope`]: normalizes V0, V1 and fee-bump envelopes into one
//!   [`EnvelopeView`] per addressable identity, resolving multiplexed
//!   accounts to [`AccountAddress`]es and computing network-bound hashes.
//! - [`MemoView`]: display form of a memo, keeping the raw bytes of text memos.
//! - [`TransactionFees`] / [`TransactionIdentity`]: declared and charged fees
//!   of each identity of a fee-bump pair.
//! - [`TransactionRecord`]: the persisted row, built from a resolved envelope
//!   and its result.
//! - [`materialize`]: renders a row as a [`TransactionResource`] for either of
//!   its hashes.
//!
//! Everything here is pure and holds no shared state, so it can be called
//! from any number of readers at once.
//!
//! # Example
//!
//! ```ignore
//! use henyey_tx::{materialize, RecordPosition, ResolvedEnvelope, TransactionRecord};
//!
//! let resolved = ResolvedEnvelope::from_base64(&envelope_xdr, &network_id)?;
//! let record = TransactionRecord::new(&resolved, &result, position, envelope_xdr, result_xdr);
//!
//! // Either hash of a fee-bump finds the same row.
//! let by_inner = materialize(record.inner_transaction_hash.as_deref().unwrap(), &record)?;
//! let by_outer = materialize(&record.transaction_hash, &record)?;
//! ```

mod account;
mod asset;
mod envelope;
mod error;
mod fee;
mod materialize;
mod memo;
mod record;

pub use account::{
    account_id_from_strkey, account_id_to_strkey, muxed_to_account_id, AccountAddress,
};
pub use asset::{
    asset_code_to_str, asset_to_string, change_trust_asset_to_string, trustline_asset_to_string,
};
pub use envelope::{
    decode_envelope, envelope_memo, signature_strings, EnvelopeKind, EnvelopeView,
    ResolvedEnvelope,
};
pub use error::TxError;
pub use fee::{FeeView, TransactionFees, TransactionIdentity};
pub use materialize::{
    materialize, materialize_without_muxed, Link, NestedTransaction, TransactionLinks,
    TransactionResource,
};
pub use memo::{MemoType, MemoView};
pub use record::{is_successful, RecordPosition, TransactionRecord};

/// Result type alias for the transaction read path.
pub type Result<T> = std::result::Result<T, TxError>;
