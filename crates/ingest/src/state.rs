//! Reserve-sponsorship state.
//!
//! [`LedgerState`] is a plain value: the processor works on a copy and hands
//! back the next state only when a whole ledger succeeds. Within a ledger,
//! the mutations of one operation are gathered into a [`ChangeSet`] and
//! written by [`LedgerState::apply`], which validates every entry and counter
//! update before writing any of them.
//!
//! A sponsorship record is an entry with a sponsor. Each record counts once
//! towards its sponsor's `num_sponsoring` and once towards its owner's
//! `num_sponsored`, so the two totals are always equal.

use std::collections::HashMap;

use henyey_tx::account_id_to_strkey;
use serde::Serialize;
use stellar_xdr::curr::AccountId;
use tracing::debug;

use crate::subject::SponsorshipSubject;
use crate::{IngestError, Result};

/// Sponsorship counters of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccountReserveState {
    /// Reserves this account pays for others.
    pub num_sponsoring: u32,
    /// Reserves of this account paid by others.
    pub num_sponsored: u32,
}

/// A live reserve-consuming entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    /// Account whose reserve the entry consumes.
    pub owner: AccountId,
    pub sponsor: Option<AccountId>,
    /// Remaining selling amount of an offer.
    pub amount: Option<i64>,
}

/// One mutation of a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    CreateEntry {
        subject: SponsorshipSubject,
        owner: AccountId,
        sponsor: Option<AccountId>,
    },
    RemoveEntry {
        subject: SponsorshipSubject,
    },
    /// Transfers (`Some`) or drops (`None`) the sponsorship of a live entry.
    SetSponsor {
        subject: SponsorshipSubject,
        sponsor: Option<AccountId>,
    },
    /// Records the remaining amount of a live offer.
    SetAmount {
        subject: SponsorshipSubject,
        amount: i64,
    },
}

/// The mutations of one operation, applied as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<StateChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter()
    }
}

/// Account-level sponsorship state across all of history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    last_ledger: Option<u32>,
    accounts: HashMap<AccountId, AccountReserveState>,
    entries: HashMap<SponsorshipSubject, EntryState>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of the last ledger folded into this state.
    pub fn last_ledger(&self) -> Option<u32> {
        self.last_ledger
    }

    pub(crate) fn set_last_ledger(&mut self, sequence: u32) {
        self.last_ledger = Some(sequence);
    }

    pub fn account(&self, account_id: &AccountId) -> Option<&AccountReserveState> {
        self.accounts.get(account_id)
    }

    /// Counters of an account, zero if it was never seen.
    pub fn reserve_state(&self, account_id: &AccountId) -> AccountReserveState {
        self.accounts.get(account_id).copied().unwrap_or_default()
    }

    pub fn entry(&self, subject: &SponsorshipSubject) -> Option<&EntryState> {
        self.entries.get(subject)
    }

    pub fn contains(&self, subject: &SponsorshipSubject) -> bool {
        self.entries.contains_key(subject)
    }

    pub fn sponsor_of(&self, subject: &SponsorshipSubject) -> Option<&AccountId> {
        self.entries.get(subject).and_then(|e| e.sponsor.as_ref())
    }

    /// Remaining amount of a live offer, if known.
    pub fn amount_of(&self, subject: &SponsorshipSubject) -> Option<i64> {
        self.entries.get(subject).and_then(|e| e.amount)
    }

    /// Entries owned by `owner`, in a stable order.
    pub fn entries_owned_by(&self, owner: &AccountId) -> Vec<SponsorshipSubject> {
        let mut owned: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.owner == *owner)
            .map(|(s, _)| s.clone())
            .collect();
        owned.sort();
        owned
    }

    /// Live sponsorship records.
    pub fn records(&self) -> impl Iterator<Item = (&SponsorshipSubject, &AccountId)> {
        self.entries
            .iter()
            .filter_map(|(s, e)| e.sponsor.as_ref().map(|sponsor| (s, sponsor)))
    }

    /// All accounts with their counters, sorted by address.
    pub fn accounts_by_address(&self) -> Vec<(String, AccountReserveState)> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|(id, state)| (account_id_to_strkey(id), *state))
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }

    pub fn total_num_sponsoring(&self) -> u64 {
        self.accounts.values().map(|a| u64::from(a.num_sponsoring)).sum()
    }

    pub fn total_num_sponsored(&self) -> u64 {
        self.accounts.values().map(|a| u64::from(a.num_sponsored)).sum()
    }

    /// Checks that every counter equals its number of live records, which
    /// implies the two totals are equal.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected: HashMap<&AccountId, AccountReserveState> = HashMap::new();
        for entry in self.entries.values() {
            if let Some(sponsor) = &entry.sponsor {
                expected.entry(sponsor).or_default().num_sponsoring += 1;
                expected.entry(&entry.owner).or_default().num_sponsored += 1;
            }
        }
        for (account, counters) in &self.accounts {
            let want = expected.remove(account).unwrap_or_default();
            if *counters != want {
                return Err(IngestError::InconsistentState(format!(
                    "account {} has counters {:?}, records imply {:?}",
                    account_id_to_strkey(account),
                    counters,
                    want
                )));
            }
        }
        if let Some((account, _)) = expected.into_iter().next() {
            return Err(IngestError::InconsistentState(format!(
                "account {} has records but no counters",
                account_id_to_strkey(account)
            )));
        }
        if self.total_num_sponsoring() != self.total_num_sponsored() {
            return Err(IngestError::InconsistentState(
                "num_sponsoring and num_sponsored totals differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies a change set atomically.
    ///
    /// All changes are first replayed against an overlay to validate entry
    /// existence and compute counter deltas; nothing is written unless every
    /// change and every resulting counter is valid.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<()> {
        let mut overlay: HashMap<&SponsorshipSubject, Option<EntryState>> = HashMap::new();
        let mut deltas: HashMap<AccountId, (i64, i64)> = HashMap::new();

        for change in changes.iter() {
            match change {
                StateChange::CreateEntry {
                    subject,
                    owner,
                    sponsor,
                } => {
                    if self.current(&overlay, subject).is_some() {
                        return Err(IngestError::InconsistentState(format!(
                            "{} already exists",
                            subject
                        )));
                    }
                    if let Some(sponsor) = sponsor {
                        add_record(&mut deltas, sponsor, owner, 1);
                    }
                    overlay.insert(
                        subject,
                        Some(EntryState {
                            owner: owner.clone(),
                            sponsor: sponsor.clone(),
                            amount: None,
                        }),
                    );
                }
                StateChange::RemoveEntry { subject } => {
                    let entry = self.current(&overlay, subject).ok_or_else(|| {
                        IngestError::InconsistentState(format!("{} does not exist", subject))
                    })?;
                    if let Some(sponsor) = &entry.sponsor {
                        add_record(&mut deltas, sponsor, &entry.owner, -1);
                    }
                    overlay.insert(subject, None);
                }
                StateChange::SetSponsor { subject, sponsor } => {
                    let mut entry = self.current(&overlay, subject).ok_or_else(|| {
                        IngestError::InconsistentState(format!("{} does not exist", subject))
                    })?;
                    if let Some(old) = &entry.sponsor {
                        add_record(&mut deltas, old, &entry.owner, -1);
                    }
                    if let Some(new) = sponsor {
                        add_record(&mut deltas, new, &entry.owner, 1);
                    }
                    entry.sponsor = sponsor.clone();
                    overlay.insert(subject, Some(entry));
                }
                StateChange::SetAmount { subject, amount } => {
                    let mut entry = self.current(&overlay, subject).ok_or_else(|| {
                        IngestError::InconsistentState(format!("{} does not exist", subject))
                    })?;
                    entry.amount = Some(*amount);
                    overlay.insert(subject, Some(entry));
                }
            }
        }

        let mut counters = Vec::with_capacity(deltas.len());
        for (account, (d_sponsoring, d_sponsored)) in deltas {
            let current = self.reserve_state(&account);
            let num_sponsoring = checked_counter(
                &account,
                "num_sponsoring",
                current.num_sponsoring,
                d_sponsoring,
            )?;
            let num_sponsored =
                checked_counter(&account, "num_sponsored", current.num_sponsored, d_sponsored)?;
            counters.push((
                account,
                AccountReserveState {
                    num_sponsoring,
                    num_sponsored,
                },
            ));
        }

        for (subject, entry) in overlay {
            match entry {
                Some(entry) => {
                    if matches!(subject, SponsorshipSubject::Account(_)) {
                        self.accounts.entry(entry.owner.clone()).or_default();
                    }
                    self.entries.insert(subject.clone(), entry);
                }
                None => {
                    self.entries.remove(subject);
                }
            }
        }
        let mut touched = Vec::with_capacity(counters.len());
        for (account, state) in counters {
            self.accounts.insert(account.clone(), state);
            touched.push(account);
        }
        for change in changes.iter() {
            if let StateChange::RemoveEntry {
                subject: SponsorshipSubject::Account(account),
            } = change
            {
                if self.reserve_state(account) != AccountReserveState::default() {
                    debug!(
                        account = %account_id_to_strkey(account),
                        "Removed account still has sponsorship records, keeping its counters"
                    );
                }
                touched.push(account.clone());
            }
        }
        self.prune_accounts(touched);
        Ok(())
    }

    /// Drops the counter rows of accounts without an account entry once their
    /// counters are back to zero.
    fn prune_accounts(&mut self, touched: Vec<AccountId>) {
        for account in touched {
            let exists = self
                .entries
                .contains_key(&SponsorshipSubject::Account(account.clone()));
            if !exists && self.reserve_state(&account) == AccountReserveState::default() {
                self.accounts.remove(&account);
            }
        }
    }

    fn current(
        &self,
        overlay: &HashMap<&SponsorshipSubject, Option<EntryState>>,
        subject: &SponsorshipSubject,
    ) -> Option<EntryState> {
        match overlay.get(subject) {
            Some(staged) => staged.clone(),
            None => self.entries.get(subject).cloned(),
        }
    }
}

fn add_record(
    deltas: &mut HashMap<AccountId, (i64, i64)>,
    sponsor: &AccountId,
    owner: &AccountId,
    delta: i64,
) {
    deltas.entry(sponsor.clone()).or_default().0 += delta;
    deltas.entry(owner.clone()).or_default().1 += delta;
}

fn checked_counter(
    account: &AccountId,
    counter: &'static str,
    current: u32,
    delta: i64,
) -> Result<u32> {
    u32::try_from(i64::from(current) + delta).map_err(|_| IngestError::CounterOutOfRange {
        account: account_id_to_strkey(account),
        counter,
    })
}
