//! Ledger processing.
//!
//! [`LedgerProcessor::process`] folds one closed ledger into a [`LedgerState`]
//! and returns the next state together with everything derived from the
//! ledger. Processing is strictly sequential and all-or-nothing: the caller's
//! state is only read, and any error discards the whole ledger.

use chrono::{DateTime, SecondsFormat, Utc};
use henyey_common::{Config, NetworkId, Toid};
use henyey_tx::{AccountAddress, RecordPosition, ResolvedEnvelope, TransactionRecord};
use serde::Serialize;
use stellar_xdr::curr::{
    InnerTransactionResultResult, Limits, Operation, OperationBody, OperationResult, ReadXdr,
    TransactionResult, TransactionResultResult,
};
use tracing::{debug, info};

use crate::changes::{entry_changes, ChangeKind, OpPosition};
use crate::effects::{emit_primary_effects, Effect, EffectEmitter, SponsorshipEvent};
use crate::input::{RawLedger, RawTransaction};
use crate::operations::{OperationOutcome, OperationRecord};
use crate::participants::{participants_of, OperationParticipants};
use crate::revocation::{revoke, RevokeOutcome};
use crate::state::{ChangeSet, LedgerState};
use crate::tracker::{EndOutcome, SponsorshipTracker};
use crate::{IngestError, Result};

/// Everything derived from one ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerOutput {
    pub transactions: Vec<TransactionRecord>,
    pub operations: Vec<OperationRecord>,
    pub effects: Vec<Effect>,
    pub participants: Vec<OperationParticipants>,
}

impl LedgerOutput {
    pub fn extend(&mut self, other: LedgerOutput) {
        self.transactions.extend(other.transactions);
        self.operations.extend(other.operations);
        self.effects.extend(other.effects);
        self.participants.extend(other.participants);
    }

    /// The transaction whose outer or inner hash is `hash`.
    pub fn find_transaction(&self, hash: &str) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|tx| {
            tx.transaction_hash.eq_ignore_ascii_case(hash)
                || tx
                    .inner_transaction_hash
                    .as_deref()
                    .is_some_and(|inner| inner.eq_ignore_ascii_case(hash))
        })
    }

    pub fn effects_for_operation(&self, operation_id: i64) -> Vec<&Effect> {
        self.effects
            .iter()
            .filter(|e| e.operation_id == operation_id)
            .collect()
    }

    /// Operations an account participates in, in history order.
    pub fn operations_for_account(&self, account: &str) -> Vec<&OperationRecord> {
        self.operations
            .iter()
            .zip(&self.participants)
            .filter(|(_, p)| p.accounts.contains(account))
            .map(|(op, _)| op)
            .collect()
    }
}

/// Sequential ledger processor.
#[derive(Debug, Clone)]
pub struct LedgerProcessor {
    network_id: NetworkId,
    strict_ordering: bool,
}

impl LedgerProcessor {
    pub fn new(network_id: NetworkId) -> Self {
        Self {
            network_id,
            strict_ordering: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            network_id: config.network.network_id(),
            strict_ordering: config.ingest.strict_ordering,
        }
    }

    /// Accept any increasing sequence instead of only the next one.
    pub fn with_strict_ordering(mut self, strict: bool) -> Self {
        self.strict_ordering = strict;
        self
    }

    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    /// Processes one ledger against `state`.
    ///
    /// On success returns the state after the ledger and its output; on
    /// failure `state` is still the state before the ledger.
    pub fn process(
        &self,
        state: &LedgerState,
        ledger: &RawLedger,
    ) -> Result<(LedgerState, LedgerOutput)> {
        self.check_order(state, ledger.sequence)?;

        let close_time = i64::try_from(ledger.close_time)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or(IngestError::InvalidCloseTime {
                ledger: ledger.sequence,
                close_time: ledger.close_time,
            })?;

        let mut next = state.clone();
        let mut output = LedgerOutput::default();
        let ctx = LedgerContext {
            sequence: ledger.sequence,
            close_time,
            created_at: close_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        for (i, raw) in ledger.transactions.iter().enumerate() {
            let tx_index = u32::try_from(i + 1).map_err(|_| IngestError::IdOverflow {
                ledger: ledger.sequence,
                tx_index: u32::MAX,
            })?;
            self.process_transaction(&mut next, &mut output, &ctx, tx_index, raw)?;
        }

        if cfg!(debug_assertions) {
            next.check_invariants()?;
        }
        next.set_last_ledger(ledger.sequence);

        info!(
            ledger = ledger.sequence,
            transactions = output.transactions.len(),
            operations = output.operations.len(),
            effects = output.effects.len(),
            "Processed ledger"
        );
        Ok((next, output))
    }

    /// Processes ledgers in order, stopping at the first failure.
    pub fn process_all(
        &self,
        state: &LedgerState,
        ledgers: &[RawLedger],
    ) -> Result<(LedgerState, LedgerOutput)> {
        let mut current = state.clone();
        let mut output = LedgerOutput::default();
        for ledger in ledgers {
            let (next, ledger_output) = self.process(&current, ledger)?;
            current = next;
            output.extend(ledger_output);
        }
        Ok((current, output))
    }

    fn check_order(&self, state: &LedgerState, sequence: u32) -> Result<()> {
        let Some(last) = state.last_ledger() else {
            return Ok(());
        };
        let expected = last.checked_add(1).ok_or(IngestError::OutOfOrderLedger {
            expected: last,
            got: sequence,
        })?;
        let in_order = if self.strict_ordering {
            sequence == expected
        } else {
            sequence >= expected
        };
        if in_order {
            Ok(())
        } else {
            Err(IngestError::OutOfOrderLedger {
                expected,
                got: sequence,
            })
        }
    }

    fn process_transaction(
        &self,
        state: &mut LedgerState,
        output: &mut LedgerOutput,
        ctx: &LedgerContext,
        tx_index: u32,
        raw: &RawTransaction,
    ) -> Result<()> {
        let resolved = ResolvedEnvelope::from_base64(&raw.envelope_xdr, &self.network_id)?;
        let result = TransactionResult::from_xdr_base64(&raw.result_xdr, Limits::none())
            .map_err(|e| IngestError::MalformedResult {
                tx_index,
                reason: e.to_string(),
            })?;

        let tx_toid = ctx.toid(tx_index, 0)?;
        let record = TransactionRecord::new(
            &resolved,
            &result,
            RecordPosition {
                toid: tx_toid,
                ledger_close_time: ctx.close_time,
            },
            raw.envelope_xdr.clone(),
            raw.result_xdr.clone(),
        );
        let tx_hash = record.transaction_hash.clone();
        let successful = record.successful;
        let operations = resolved.operations();

        let op_results = if successful {
            let results = operation_results(&result).ok_or_else(|| IngestError::MalformedResult {
                tx_index,
                reason: "successful result without operation results".to_string(),
            })?;
            if results.len() != operations.len() {
                return Err(IngestError::MalformedResult {
                    tx_index,
                    reason: format!(
                        "{} operation results for {} operations",
                        results.len(),
                        operations.len()
                    ),
                });
            }
            Some(results)
        } else {
            None
        };

        debug!(
            transaction = %tx_hash,
            tx_index,
            successful,
            fee_bump = resolved.is_fee_bump(),
            "Processing transaction"
        );

        let view = resolved.transaction_view();
        let mut tracker = SponsorshipTracker::new();
        for (i, op) in operations.iter().enumerate() {
            let op_index = u32::try_from(i).map_err(|_| IngestError::IdOverflow {
                ledger: ctx.sequence,
                tx_index,
            })?;
            let op_toid = ctx.toid(tx_index, op_index + 1)?;
            let source = view.operation_source(op);

            let mut outcome = OperationOutcome::default();
            if let Some(results) = op_results {
                let mut emitter = EffectEmitter::new(op_toid, ctx.created_at.clone());
                outcome = apply_operation(
                    state,
                    &mut tracker,
                    &mut emitter,
                    op,
                    &source,
                    &results[i],
                    OpPosition { tx_index, op_index },
                )?;
                output.effects.extend(emitter.finish());
            }

            output.participants.push(OperationParticipants {
                operation_id: op_toid.to_i64(),
                accounts: participants_of(&op.body, &source, &outcome),
            });
            output.operations.push(OperationRecord::new(
                op_toid,
                &tx_hash,
                successful,
                &ctx.created_at,
                &op.body,
                &source,
                &outcome,
            )?);
        }
        tracker.finish(&tx_hash);

        output.transactions.push(record);
        Ok(())
    }
}

struct LedgerContext {
    sequence: u32,
    close_time: DateTime<Utc>,
    created_at: String,
}

impl LedgerContext {
    fn toid(&self, tx_index: u32, operation_index: u32) -> Result<Toid> {
        Toid::new(self.sequence, tx_index, operation_index).ok_or(IngestError::IdOverflow {
            ledger: self.sequence,
            tx_index,
        })
    }
}

/// Operation results of a transaction that applied.
fn operation_results(result: &TransactionResult) -> Option<&[OperationResult]> {
    match &result.result {
        TransactionResultResult::TxSuccess(results) => Some(results.as_slice()),
        TransactionResultResult::TxFeeBumpInnerSuccess(pair) => match &pair.result.result {
            InnerTransactionResultResult::TxSuccess(results) => Some(results.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

/// Applies one successful operation: bracket bookkeeping, entry changes,
/// attribution and effects. State changes of the operation are written as a
/// single change set.
fn apply_operation(
    state: &mut LedgerState,
    tracker: &mut SponsorshipTracker,
    emitter: &mut EffectEmitter,
    op: &Operation,
    source: &AccountAddress,
    result: &OperationResult,
    position: OpPosition,
) -> Result<OperationOutcome> {
    let mut outcome = OperationOutcome::default();
    let mut changes = ChangeSet::new();

    match &op.body {
        OperationBody::BeginSponsoringFutureReserves(begin) => {
            tracker.begin(&source.account_id, &begin.sponsored_id, position.op_index);
        }
        OperationBody::EndSponsoringFutureReserves => {
            if let EndOutcome::Closed(bracket) = tracker.end(&source.account_id) {
                outcome.closed_bracket = Some(bracket);
            }
        }
        OperationBody::RevokeSponsorship(revoke_op) => {
            let revocation = revoke(revoke_op, &source.account_id, state, tracker);
            match &revocation {
                RevokeOutcome::Removed {
                    subject,
                    owner,
                    former_sponsor,
                } => emitter.sponsorship(
                    owner,
                    subject,
                    &SponsorshipEvent::Removed {
                        former_sponsor: former_sponsor.clone(),
                    },
                ),
                RevokeOutcome::Transferred {
                    subject,
                    owner,
                    former_sponsor,
                    new_sponsor,
                } => emitter.sponsorship(
                    owner,
                    subject,
                    &SponsorshipEvent::Updated {
                        former_sponsor: former_sponsor.clone(),
                        new_sponsor: new_sponsor.clone(),
                    },
                ),
                RevokeOutcome::Nonexistent { .. } => {}
            }
            for change in revocation.changes().iter() {
                changes.push(change.clone());
            }
            outcome.revocation = Some(revocation);
        }
        _ => {}
    }

    let entry_changes = entry_changes(&op.body, &source.account_id, result, state, position)?;
    emit_primary_effects(emitter, &op.body, source, result, &entry_changes, position)?;

    for change in &entry_changes {
        let sponsor = match change.kind {
            ChangeKind::Created if outcome.sponsor.is_none() => {
                tracker.active_sponsor_for(&change.owner).cloned()
            }
            ChangeKind::Removed => {
                if let Some(former_sponsor) = state.sponsor_of(&change.subject) {
                    emitter.sponsorship(
                        &change.owner,
                        &change.subject,
                        &SponsorshipEvent::Removed {
                            former_sponsor: former_sponsor.clone(),
                        },
                    );
                }
                None
            }
            _ => None,
        };
        if let Some(sponsor) = &sponsor {
            emitter.sponsorship(
                &change.owner,
                &change.subject,
                &SponsorshipEvent::Created {
                    sponsor: sponsor.clone(),
                },
            );
            outcome.sponsor = Some(sponsor.clone());
        }
        if let Some(state_change) = change.to_state_change(sponsor) {
            changes.push(state_change);
        }
        if let Some(amount_change) = change.amount_change() {
            changes.push(amount_change);
        }
    }

    state.apply(&changes)?;

    debug!(
        tx_index = position.tx_index,
        op_index = position.op_index,
        changes = changes.len(),
        sponsor = ?outcome.sponsor.as_ref().map(henyey_tx::account_id_to_strkey),
        "Applied operation"
    );
    Ok(outcome)
}
