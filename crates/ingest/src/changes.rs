//! Reserve-consuming entries created, updated or removed by an operation.
//!
//! Only successful operations are classified. Offer and claimable balance
//! identities come from the operation result; everything else is read off the
//! operation body. Entries that existed before ingestion started are unknown
//! to the state, so updates and removals of them are dropped.
//!
//! Offers also change when someone else's trade crosses them. Every claim in a
//! manage-offer or path-payment result lowers the remaining amount of the
//! claimed offer, and a claim that drains it removes the offer.

use henyey_crypto::signer_key_to_strkey;
use henyey_tx::change_trust_asset_to_string;
use stellar_xdr::curr::{
    AccountId, ClaimAtom, CreateClaimableBalanceResult, ManageBuyOfferResult,
    ManageOfferSuccessResult, ManageOfferSuccessResultOffer, ManageSellOfferResult,
    OperationBody, OperationResult, OperationResultTr, PathPaymentStrictReceiveResult,
    PathPaymentStrictSendResult, PublicKey,
};

use crate::state::{LedgerState, StateChange};
use crate::subject::{SponsorshipSubject, SubjectKind};
use crate::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChange {
    pub subject: SponsorshipSubject,
    /// Account whose reserve the entry consumes.
    pub owner: AccountId,
    pub kind: ChangeKind,
    /// Remaining amount, for offers that stay live.
    pub amount: Option<i64>,
}

impl EntryChange {
    /// The state mutation for this change. Updates do not touch reserves.
    pub fn to_state_change(&self, sponsor: Option<AccountId>) -> Option<StateChange> {
        match self.kind {
            ChangeKind::Created => Some(StateChange::CreateEntry {
                subject: self.subject.clone(),
                owner: self.owner.clone(),
                sponsor,
            }),
            ChangeKind::Removed => Some(StateChange::RemoveEntry {
                subject: self.subject.clone(),
            }),
            ChangeKind::Updated => None,
        }
    }

    /// Records the remaining amount of an offer that is still live.
    pub fn amount_change(&self) -> Option<StateChange> {
        let amount = self.amount.filter(|_| self.kind != ChangeKind::Removed)?;
        Some(StateChange::SetAmount {
            subject: self.subject.clone(),
            amount,
        })
    }
}

/// Position of the operation being classified, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct OpPosition {
    pub tx_index: u32,
    pub op_index: u32,
}

impl OpPosition {
    fn unexpected_result(self) -> IngestError {
        IngestError::UnexpectedOperationResult {
            tx_index: self.tx_index,
            op_index: self.op_index,
        }
    }
}

/// Classifies the entry changes of one successful operation.
pub fn entry_changes(
    body: &OperationBody,
    source: &AccountId,
    result: &OperationResult,
    state: &LedgerState,
    position: OpPosition,
) -> Result<Vec<EntryChange>> {
    let mut changes = Vec::new();
    match body {
        OperationBody::CreateAccount(op) => {
            let subject = SponsorshipSubject::Account(op.destination.clone());
            changes.push(upsert(state, subject, op.destination.clone()));
        }
        OperationBody::SetOptions(op) => {
            if let Some(signer) = &op.signer {
                let subject = SponsorshipSubject::Signer {
                    account: source.clone(),
                    signer: signer_key_to_strkey(&signer.key),
                };
                if signer.weight > 0 {
                    changes.push(upsert(state, subject, source.clone()));
                } else {
                    changes.extend(remove_known(state, subject));
                }
            }
        }
        OperationBody::ChangeTrust(op) => {
            let subject = SponsorshipSubject::Trustline {
                account: source.clone(),
                asset: change_trust_asset_to_string(&op.line)?,
            };
            if op.limit > 0 {
                changes.push(upsert(state, subject, source.clone()));
            } else {
                changes.extend(remove_known(state, subject));
            }
        }
        OperationBody::ManageData(op) => {
            let subject = SponsorshipSubject::data(source.clone(), op.data_name.as_vec());
            if op.data_value.is_some() {
                changes.push(upsert(state, subject, source.clone()));
            } else {
                changes.extend(remove_known(state, subject));
            }
        }
        OperationBody::ManageSellOffer(op) => {
            let success = match result {
                OperationResult::OpInner(OperationResultTr::ManageSellOffer(
                    ManageSellOfferResult::Success(success),
                )) => success,
                _ => return Err(position.unexpected_result()),
            };
            changes.extend(claimed_offers(state, &success.offers_claimed));
            changes.extend(offer_change(state, source, op.offer_id, success));
        }
        OperationBody::ManageBuyOffer(op) => {
            let success = match result {
                OperationResult::OpInner(OperationResultTr::ManageBuyOffer(
                    ManageBuyOfferResult::Success(success),
                )) => success,
                _ => return Err(position.unexpected_result()),
            };
            changes.extend(claimed_offers(state, &success.offers_claimed));
            changes.extend(offer_change(state, source, op.offer_id, success));
        }
        OperationBody::CreatePassiveSellOffer(_) => {
            let success = match result {
                OperationResult::OpInner(OperationResultTr::CreatePassiveSellOffer(
                    ManageSellOfferResult::Success(success),
                )) => success,
                _ => return Err(position.unexpected_result()),
            };
            changes.extend(claimed_offers(state, &success.offers_claimed));
            changes.extend(offer_change(state, source, 0, success));
        }
        OperationBody::PathPaymentStrictReceive(_) => {
            let success = match result {
                OperationResult::OpInner(OperationResultTr::PathPaymentStrictReceive(
                    PathPaymentStrictReceiveResult::Success(success),
                )) => success,
                _ => return Err(position.unexpected_result()),
            };
            changes.extend(claimed_offers(state, &success.offers));
        }
        OperationBody::PathPaymentStrictSend(_) => {
            let success = match result {
                OperationResult::OpInner(OperationResultTr::PathPaymentStrictSend(
                    PathPaymentStrictSendResult::Success(success),
                )) => success,
                _ => return Err(position.unexpected_result()),
            };
            changes.extend(claimed_offers(state, &success.offers));
        }
        OperationBody::CreateClaimableBalance(_) => {
            let balance_id = match result {
                OperationResult::OpInner(OperationResultTr::CreateClaimableBalance(
                    CreateClaimableBalanceResult::Success(id),
                )) => id,
                _ => return Err(position.unexpected_result()),
            };
            let subject = SponsorshipSubject::claimable_balance(balance_id);
            changes.push(upsert(state, subject, source.clone()));
        }
        OperationBody::ClaimClaimableBalance(op) => {
            changes.extend(remove_known(
                state,
                SponsorshipSubject::claimable_balance(&op.balance_id),
            ));
        }
        OperationBody::ClawbackClaimableBalance(op) => {
            changes.extend(remove_known(
                state,
                SponsorshipSubject::claimable_balance(&op.balance_id),
            ));
        }
        OperationBody::AccountMerge(_) => {
            for subject in state.entries_owned_by(source) {
                // Claimable balances outlive their creator.
                if subject.kind() == SubjectKind::ClaimableBalance {
                    continue;
                }
                changes.push(EntryChange {
                    subject,
                    owner: source.clone(),
                    kind: ChangeKind::Removed,
                    amount: None,
                });
            }
        }
        _ => {}
    }
    Ok(changes)
}

fn upsert(state: &LedgerState, subject: SponsorshipSubject, owner: AccountId) -> EntryChange {
    let kind = if state.contains(&subject) {
        ChangeKind::Updated
    } else {
        ChangeKind::Created
    };
    EntryChange {
        subject,
        owner,
        kind,
        amount: None,
    }
}

fn remove_known(state: &LedgerState, subject: SponsorshipSubject) -> Option<EntryChange> {
    let owner = state.entry(&subject)?.owner.clone();
    Some(EntryChange {
        subject,
        owner,
        kind: ChangeKind::Removed,
        amount: None,
    })
}

/// Claims against known offers. A partial fill lowers the remaining amount
/// and a claim that drains the offer removes it.
fn claimed_offers(state: &LedgerState, claims: &[ClaimAtom]) -> Vec<EntryChange> {
    claims
        .iter()
        .filter_map(|claim| {
            let (seller, offer_id, amount_sold) = match claim {
                ClaimAtom::V0(atom) => (
                    AccountId(PublicKey::PublicKeyTypeEd25519(atom.seller_ed25519.clone())),
                    atom.offer_id,
                    atom.amount_sold,
                ),
                ClaimAtom::OrderBook(atom) => {
                    (atom.seller_id.clone(), atom.offer_id, atom.amount_sold)
                }
                ClaimAtom::LiquidityPool(_) => return None,
            };
            let subject = SponsorshipSubject::Offer { seller, offer_id };
            let entry = state.entry(&subject)?;
            let remaining = entry.amount?.saturating_sub(amount_sold);
            let owner = entry.owner.clone();
            Some(if remaining > 0 {
                EntryChange {
                    subject,
                    owner,
                    kind: ChangeKind::Updated,
                    amount: Some(remaining),
                }
            } else {
                EntryChange {
                    subject,
                    owner,
                    kind: ChangeKind::Removed,
                    amount: None,
                }
            })
        })
        .collect()
}

fn offer_change(
    state: &LedgerState,
    source: &AccountId,
    offer_id: i64,
    success: &ManageOfferSuccessResult,
) -> Option<EntryChange> {
    match &success.offer {
        ManageOfferSuccessResultOffer::Created(offer) => {
            let subject = SponsorshipSubject::Offer {
                seller: offer.seller_id.clone(),
                offer_id: offer.offer_id,
            };
            Some(EntryChange {
                amount: Some(offer.amount),
                ..upsert(state, subject, offer.seller_id.clone())
            })
        }
        ManageOfferSuccessResultOffer::Updated(offer) => {
            let subject = SponsorshipSubject::Offer {
                seller: offer.seller_id.clone(),
                offer_id: offer.offer_id,
            };
            state.contains(&subject).then(|| EntryChange {
                subject,
                owner: offer.seller_id.clone(),
                kind: ChangeKind::Updated,
                amount: Some(offer.amount),
            })
        }
        ManageOfferSuccessResultOffer::Deleted if offer_id != 0 => remove_known(
            state,
            SponsorshipSubject::Offer {
                seller: source.clone(),
                offer_id,
            },
        ),
        ManageOfferSuccessResultOffer::Deleted => None,
    }
}
