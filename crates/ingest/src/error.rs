//! Error types for ledger ingestion.
//!
//! Any error aborts the ledger being processed; the caller keeps its previous
//! [`LedgerState`](crate::LedgerState) and may retry the whole ledger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// An envelope could not be resolved.
    #[error(transparent)]
    Tx(#[from] henyey_tx::TxError),

    /// Ledger input JSON could not be parsed.
    #[error("invalid ledger input: {0}")]
    Input(#[from] serde_json::Error),

    /// Ledgers must be processed in increasing sequence order.
    #[error("ledger {got} is out of order, expected {expected}")]
    OutOfOrderLedger { expected: u32, got: u32 },

    /// A transaction result could not be decoded or does not fit its envelope.
    #[error("transaction {tx_index}: malformed result: {reason}")]
    MalformedResult { tx_index: u32, reason: String },

    /// A successful operation carries a result of the wrong type.
    #[error("transaction {tx_index}, operation {op_index}: unexpected operation result")]
    UnexpectedOperationResult { tx_index: u32, op_index: u32 },

    /// A sponsorship counter would leave the `u32` range.
    #[error("{counter} of account {account} out of range")]
    CounterOutOfRange {
        account: String,
        counter: &'static str,
    },

    /// A change set does not fit the current state.
    #[error("inconsistent state change: {0}")]
    InconsistentState(String),

    /// The ledger close time is not a representable timestamp.
    #[error("ledger {ledger}: invalid close time {close_time}")]
    InvalidCloseTime { ledger: u32, close_time: u64 },

    /// A transaction or operation position does not fit a total-order id.
    #[error("ledger {ledger}: transaction {tx_index} does not fit a total-order id")]
    IdOverflow { ledger: u32, tx_index: u32 },
}
