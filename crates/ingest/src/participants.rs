//! Accounts an operation is visible to.

use std::collections::BTreeSet;

use henyey_tx::{account_id_to_strkey, muxed_to_account_id, AccountAddress};
use serde::Serialize;
use stellar_xdr::curr::{AccountId, Claimant, OperationBody};

use crate::operations::OperationOutcome;

/// Participants of one operation, as G-addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationParticipants {
    pub operation_id: i64,
    pub accounts: BTreeSet<String>,
}

/// Computes the participants of an operation.
///
/// Besides the source and the counterparties named in the body, this includes
/// accounts that only take part through sponsorship: the sponsor an entry was
/// attributed to, the sponsor of a closed bracket, and for a revocation the
/// entry owner together with the former and new sponsors.
pub fn participants_of(
    body: &OperationBody,
    source: &AccountAddress,
    outcome: &OperationOutcome,
) -> BTreeSet<String> {
    let mut accounts: Vec<&AccountId> = vec![&source.account_id];
    let mut owned: Vec<AccountId> = Vec::new();

    match body {
        OperationBody::CreateAccount(op) => accounts.push(&op.destination),
        OperationBody::Payment(op) => owned.push(muxed_to_account_id(&op.destination)),
        OperationBody::PathPaymentStrictReceive(op) => {
            owned.push(muxed_to_account_id(&op.destination))
        }
        OperationBody::PathPaymentStrictSend(op) => {
            owned.push(muxed_to_account_id(&op.destination))
        }
        OperationBody::AccountMerge(destination) => owned.push(muxed_to_account_id(destination)),
        OperationBody::AllowTrust(op) => accounts.push(&op.trustor),
        OperationBody::SetTrustLineFlags(op) => accounts.push(&op.trustor),
        OperationBody::Clawback(op) => owned.push(muxed_to_account_id(&op.from)),
        OperationBody::BeginSponsoringFutureReserves(op) => accounts.push(&op.sponsored_id),
        OperationBody::CreateClaimableBalance(op) => {
            for claimant in op.claimants.iter() {
                let Claimant::ClaimantTypeV0(claimant) = claimant;
                accounts.push(&claimant.destination);
            }
        }
        _ => {}
    }

    accounts.extend(outcome.sponsor.as_ref());
    if let Some(bracket) = &outcome.closed_bracket {
        accounts.push(&bracket.sponsor);
    }
    if let Some(revocation) = &outcome.revocation {
        accounts.extend(revocation.owner());
        accounts.extend(revocation.former_sponsor());
        accounts.extend(revocation.new_sponsor());
        if revocation.owner().is_none() {
            accounts.extend(revocation.subject().and_then(|s| s.account()));
        }
    }

    accounts
        .into_iter()
        .chain(owned.iter())
        .map(account_id_to_strkey)
        .collect()
}
