//! Ledger input.
//!
//! Closed ledgers arrive as JSON with base64 XDR payloads:
//!
//! ```json
//! [
//!   {
//!     "sequence": 2,
//!     "close_time": 1600000000,
//!     "transactions": [{ "envelope_xdr": "AAAAAg...", "result_xdr": "AAAAAA..." }]
//!   }
//! ]
//! ```
//!
//! Payloads stay encoded here; the processor decodes them so that a bad
//! payload aborts exactly the ledger that contains it.

use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{Limits, TransactionEnvelope, TransactionResult, WriteXdr};

use crate::Result;

/// A closed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLedger {
    pub sequence: u32,
    /// Close time in unix seconds.
    pub close_time: u64,
    /// Transactions in application order.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// One applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub envelope_xdr: String,
    pub result_xdr: String,
}

impl RawTransaction {
    /// Encodes a decoded envelope and result.
    pub fn from_xdr(envelope: &TransactionEnvelope, result: &TransactionResult) -> Result<Self> {
        Ok(Self {
            envelope_xdr: envelope
                .to_xdr_base64(Limits::none())
                .map_err(henyey_tx::TxError::from)?,
            result_xdr: result
                .to_xdr_base64(Limits::none())
                .map_err(henyey_tx::TxError::from)?,
        })
    }
}

/// Parses a JSON array of ledgers.
pub fn parse_ledgers(json: &str) -> Result<Vec<RawLedger>> {
    Ok(serde_json::from_str(json)?)
}
