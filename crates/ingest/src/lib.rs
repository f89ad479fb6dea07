//! Ledger ingestion for the henyey history service.
//!
//! This crate folds closed ledgers into reserve-sponsorship state and derives
//! the operation, effect and participant logs clients query:
//!
//! - [`LedgerProcessor`]: sequential, all-or-nothing processing of one ledger
//!   against a [`LedgerState`] value.
//! - [`SponsorshipTracker`]: transaction-scoped begin/end brackets that
//!   attribute new entries to a sponsor.
//! - [`revoke`]: stand-alone revocation, removing or transferring a record.
//! - [`entry_changes`]: the reserve-consuming entries an operation touches.
//! - [`EffectEmitter`]: numbered effects, primary before sponsorship.
//! - [`participants_of`]: accounts an operation is visible to, including
//!   sponsors that are neither its source nor its target.
//!
//! # Example
//!
//! ```ignore
//! use henyey_ingest::{parse_ledgers, LedgerProcessor, LedgerState};
//!
//! let processor = LedgerProcessor::from_config(&config);
//! let mut state = LedgerState::new();
//! for ledger in parse_ledgers(&json)? {
//!     let (next, output) = processor.process(&state, &ledger)?;
//!     state = next;
//!     publish(output);
//! }
//! ```

mod amount;
mod changes;
mod effects;
mod error;
mod input;
mod operations;
mod participants;
mod processor;
mod revocation;
mod state;
mod subject;
mod tracker;

pub use amount::format_amount;
pub use changes::{entry_changes, ChangeKind, EntryChange, OpPosition};
pub use effects::{
    emit_primary_effects, AssetFields, Effect, EffectDetails, EffectEmitter, EffectLinks,
    SponsorshipEvent,
};
pub use error::IngestError;
pub use input::{parse_ledgers, RawLedger, RawTransaction};
pub use operations::{
    operation_type_name, ClaimantView, OperationDetails, OperationOutcome, OperationRecord,
    RevokeDetails,
};
pub use participants::{participants_of, OperationParticipants};
pub use processor::{LedgerOutput, LedgerProcessor};
pub use revocation::{revoke, RevokeOutcome};
pub use state::{AccountReserveState, ChangeSet, EntryState, LedgerState, StateChange};
pub use subject::{claimable_balance_id_string, SponsorshipSubject, SubjectKind};
pub use tracker::{
    BeginOutcome, BeginRejection, EndOutcome, SponsorshipBracket, SponsorshipTracker,
};

/// Result type alias for ingestion.
pub type Result<T> = std::result::Result<T, IngestError>;
