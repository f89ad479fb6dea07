//! Transaction-scoped sponsorship brackets.
//!
//! A [`SponsorshipTracker`] lives for exactly one transaction. Each
//! begin-sponsoring operation opens a bracket; while it is open, entries
//! created for the sponsored account are paid for by the bracket's sponsor.

use henyey_tx::account_id_to_strkey;
use stellar_xdr::curr::AccountId;
use tracing::{debug, warn};

/// An open begin/end interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorshipBracket {
    pub sponsor: AccountId,
    pub sponsored: AccountId,
    /// Index of the begin-sponsoring operation within the transaction.
    pub opened_at: u32,
}

/// Why a begin-sponsoring operation did not open a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginRejection {
    /// The source tried to sponsor itself.
    SelfSponsorship,
    /// The sponsored account already has an open bracket.
    AlreadySponsored,
    /// The sponsor is itself sponsored, or the sponsored account is sponsoring.
    Recursive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    Opened,
    Rejected(BeginRejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    Closed(SponsorshipBracket),
    /// No bracket was open for the source; nothing happens.
    Unbalanced,
}

/// LIFO stack of open brackets for one transaction.
#[derive(Debug, Default)]
pub struct SponsorshipTracker {
    stack: Vec<SponsorshipBracket>,
}

impl SponsorshipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a bracket in which `sponsor` pays the reserves of `sponsored`.
    pub fn begin(
        &mut self,
        sponsor: &AccountId,
        sponsored: &AccountId,
        op_index: u32,
    ) -> BeginOutcome {
        let rejection = if sponsor == sponsored {
            Some(BeginRejection::SelfSponsorship)
        } else if self.is_sponsored(sponsored) {
            Some(BeginRejection::AlreadySponsored)
        } else if self.is_sponsored(sponsor) || self.is_sponsoring(sponsored) {
            Some(BeginRejection::Recursive)
        } else {
            None
        };

        if let Some(reason) = rejection {
            warn!(
                sponsor = %account_id_to_strkey(sponsor),
                sponsored = %account_id_to_strkey(sponsored),
                op_index,
                ?reason,
                "Ignoring begin sponsoring future reserves"
            );
            return BeginOutcome::Rejected(reason);
        }

        self.stack.push(SponsorshipBracket {
            sponsor: sponsor.clone(),
            sponsored: sponsored.clone(),
            opened_at: op_index,
        });
        BeginOutcome::Opened
    }

    /// Closes the innermost bracket opened for `source`.
    pub fn end(&mut self, source: &AccountId) -> EndOutcome {
        match self.stack.iter().rposition(|b| &b.sponsored == source) {
            Some(pos) => EndOutcome::Closed(self.stack.remove(pos)),
            None => {
                debug!(
                    source = %account_id_to_strkey(source),
                    "End sponsoring without an open bracket"
                );
                EndOutcome::Unbalanced
            }
        }
    }

    /// Sponsor of the innermost open bracket for `sponsored`.
    pub fn active_sponsor_for(&self, sponsored: &AccountId) -> Option<&AccountId> {
        self.stack
            .iter()
            .rev()
            .find(|b| &b.sponsored == sponsored)
            .map(|b| &b.sponsor)
    }

    pub fn is_sponsored(&self, account_id: &AccountId) -> bool {
        self.stack.iter().any(|b| &b.sponsored == account_id)
    }

    pub fn is_sponsoring(&self, account_id: &AccountId) -> bool {
        self.stack.iter().any(|b| &b.sponsor == account_id)
    }

    pub fn open_brackets(&self) -> &[SponsorshipBracket] {
        &self.stack
    }

    /// Ends the transaction, discarding any bracket left open.
    pub fn finish(self, transaction_hash: &str) {
        for bracket in &self.stack {
            warn!(
                transaction = transaction_hash,
                sponsor = %account_id_to_strkey(&bracket.sponsor),
                sponsored = %account_id_to_strkey(&bracket.sponsored),
                opened_at = bracket.opened_at,
                "Discarding sponsorship bracket left open at transaction end"
            );
        }
    }
}
