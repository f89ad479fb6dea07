//! Stand-alone revoke-sponsorship operations.

use henyey_tx::account_id_to_strkey;
use stellar_xdr::curr::{AccountId, RevokeSponsorshipOp};
use tracing::debug;

use crate::state::{ChangeSet, LedgerState, StateChange};
use crate::subject::SponsorshipSubject;
use crate::tracker::SponsorshipTracker;

/// What a revoke did to the sponsorship record it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The owner pays its own reserve again.
    Removed {
        subject: SponsorshipSubject,
        owner: AccountId,
        former_sponsor: AccountId,
    },
    /// The reserve moved to the sponsor of the revoking account's open bracket.
    Transferred {
        subject: SponsorshipSubject,
        owner: AccountId,
        former_sponsor: AccountId,
        new_sponsor: AccountId,
    },
    /// No live record for the subject; nothing changes.
    Nonexistent { subject: Option<SponsorshipSubject> },
}

impl RevokeOutcome {
    pub fn subject(&self) -> Option<&SponsorshipSubject> {
        match self {
            RevokeOutcome::Removed { subject, .. } | RevokeOutcome::Transferred { subject, .. } => {
                Some(subject)
            }
            RevokeOutcome::Nonexistent { subject } => subject.as_ref(),
        }
    }

    pub fn owner(&self) -> Option<&AccountId> {
        match self {
            RevokeOutcome::Removed { owner, .. } | RevokeOutcome::Transferred { owner, .. } => {
                Some(owner)
            }
            RevokeOutcome::Nonexistent { .. } => None,
        }
    }

    pub fn former_sponsor(&self) -> Option<&AccountId> {
        match self {
            RevokeOutcome::Removed { former_sponsor, .. }
            | RevokeOutcome::Transferred { former_sponsor, .. } => Some(former_sponsor),
            RevokeOutcome::Nonexistent { .. } => None,
        }
    }

    pub fn new_sponsor(&self) -> Option<&AccountId> {
        match self {
            RevokeOutcome::Transferred { new_sponsor, .. } => Some(new_sponsor),
            _ => None,
        }
    }

    /// The state mutation this outcome implies.
    pub fn changes(&self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        match self {
            RevokeOutcome::Removed { subject, .. } => changes.push(StateChange::SetSponsor {
                subject: subject.clone(),
                sponsor: None,
            }),
            RevokeOutcome::Transferred {
                subject,
                new_sponsor,
                ..
            } => changes.push(StateChange::SetSponsor {
                subject: subject.clone(),
                sponsor: Some(new_sponsor.clone()),
            }),
            RevokeOutcome::Nonexistent { .. } => {}
        }
        changes
    }
}

/// Resolves a revoke operation against the current state.
///
/// If the revoking account is itself inside an open bracket whose sponsor is
/// neither the entry owner nor the current sponsor, the record is transferred
/// to that sponsor; otherwise it is removed.
pub fn revoke(
    op: &RevokeSponsorshipOp,
    source: &AccountId,
    state: &LedgerState,
    tracker: &SponsorshipTracker,
) -> RevokeOutcome {
    let Some(subject) = SponsorshipSubject::from_revoke(op) else {
        debug!("Revoke names an entry type without reserves");
        return RevokeOutcome::Nonexistent { subject: None };
    };
    let Some(entry) = state.entry(&subject) else {
        debug!(%subject, "Revoke of unknown entry");
        return RevokeOutcome::Nonexistent {
            subject: Some(subject),
        };
    };
    let Some(former_sponsor) = entry.sponsor.clone() else {
        debug!(%subject, "Revoke of entry without sponsor");
        return RevokeOutcome::Nonexistent {
            subject: Some(subject),
        };
    };
    let owner = entry.owner.clone();

    match tracker.active_sponsor_for(source) {
        Some(new_sponsor) if *new_sponsor != owner && *new_sponsor != former_sponsor => {
            debug!(
                %subject,
                former_sponsor = %account_id_to_strkey(&former_sponsor),
                new_sponsor = %account_id_to_strkey(new_sponsor),
                "Transferring sponsorship"
            );
            RevokeOutcome::Transferred {
                subject,
                owner,
                former_sponsor,
                new_sponsor: new_sponsor.clone(),
            }
        }
        _ => {
            debug!(
                %subject,
                former_sponsor = %account_id_to_strkey(&former_sponsor),
                "Removing sponsorship"
            );
            RevokeOutcome::Removed {
                subject,
                owner,
                former_sponsor,
            }
        }
    }
}
