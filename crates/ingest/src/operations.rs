//! Operation resources.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use henyey_common::Toid;
use henyey_crypto::signer_key_to_strkey;
use henyey_tx::{
    account_id_to_strkey, asset_to_string, change_trust_asset_to_string, AccountAddress,
};
use serde::Serialize;
use stellar_xdr::curr::{
    AccountId, Claimant, OperationBody, OperationType, RevokeSponsorshipOp,
};

use crate::amount::format_amount;
use crate::effects::AssetFields;
use crate::revocation::RevokeOutcome;
use crate::subject::{claimable_balance_id_string, SponsorshipSubject};
use crate::tracker::SponsorshipBracket;
use crate::Result;

/// What sponsorship processing decided for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    /// Sponsor the operation's new entry was attributed to.
    pub sponsor: Option<AccountId>,
    /// Bracket closed by an end-sponsoring operation.
    pub closed_bracket: Option<SponsorshipBracket>,
    pub revocation: Option<RevokeOutcome>,
}

/// Horizon name of an operation type.
pub fn operation_type_name(op_type: OperationType) -> &'static str {
    match op_type {
        OperationType::CreateAccount => "create_account",
        OperationType::Payment => "payment",
        OperationType::PathPaymentStrictReceive => "path_payment_strict_receive",
        OperationType::ManageSellOffer => "manage_sell_offer",
        OperationType::CreatePassiveSellOffer => "create_passive_sell_offer",
        OperationType::SetOptions => "set_options",
        OperationType::ChangeTrust => "change_trust",
        OperationType::AllowTrust => "allow_trust",
        OperationType::AccountMerge => "account_merge",
        OperationType::Inflation => "inflation",
        OperationType::ManageData => "manage_data",
        OperationType::BumpSequence => "bump_sequence",
        OperationType::ManageBuyOffer => "manage_buy_offer",
        OperationType::PathPaymentStrictSend => "path_payment_strict_send",
        OperationType::CreateClaimableBalance => "create_claimable_balance",
        OperationType::ClaimClaimableBalance => "claim_claimable_balance",
        OperationType::BeginSponsoringFutureReserves => "begin_sponsoring_future_reserves",
        OperationType::EndSponsoringFutureReserves => "end_sponsoring_future_reserves",
        OperationType::RevokeSponsorship => "revoke_sponsorship",
        OperationType::Clawback => "clawback",
        OperationType::ClawbackClaimableBalance => "clawback_claimable_balance",
        OperationType::SetTrustLineFlags => "set_trust_line_flags",
        OperationType::LiquidityPoolDeposit => "liquidity_pool_deposit",
        OperationType::LiquidityPoolWithdraw => "liquidity_pool_withdraw",
        OperationType::InvokeHostFunction => "invoke_host_function",
        OperationType::ExtendFootprintTtl => "extend_footprint_ttl",
        OperationType::RestoreFootprint => "restore_footprint",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimantView {
    pub destination: String,
}

/// Type-specific operation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationDetails {
    CreateAccount {
        starting_balance: String,
        funder: String,
        account: String,
    },
    Payment {
        #[serde(flatten)]
        asset: AssetFields,
        from: String,
        to: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        to_muxed: Option<String>,
        amount: String,
    },
    SetOptions {
        #[serde(skip_serializing_if = "Option::is_none")]
        low_threshold: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        med_threshold: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        high_threshold: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        home_domain: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        signer_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        signer_weight: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        master_key_weight: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        set_flags: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        clear_flags: Option<u32>,
    },
    ChangeTrust {
        asset: String,
        limit: String,
        trustor: String,
    },
    ManageData {
        name: String,
        value: String,
    },
    AccountMerge {
        account: String,
        into: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        into_muxed: Option<String>,
    },
    BumpSequence {
        bump_to: String,
    },
    CreateClaimableBalance {
        asset: String,
        amount: String,
        claimants: Vec<ClaimantView>,
    },
    ClaimClaimableBalance {
        balance_id: String,
        claimant: String,
    },
    BeginSponsoringFutureReserves {
        sponsored_id: String,
    },
    EndSponsoringFutureReserves {
        #[serde(skip_serializing_if = "Option::is_none")]
        begin_sponsor: Option<String>,
    },
    RevokeSponsorship(RevokeDetails),
    Other {},
}

/// The subject of a revoke, in the field layout clients expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevokeDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimable_balance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trustline_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trustline_asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_key: Option<String>,
}

impl RevokeDetails {
    pub fn from_op(op: &RevokeSponsorshipOp) -> Self {
        match SponsorshipSubject::from_revoke(op) {
            Some(SponsorshipSubject::Account(account)) => Self {
                account_id: Some(account_id_to_strkey(&account)),
                ..Self::default()
            },
            Some(SponsorshipSubject::ClaimableBalance(id)) => Self {
                claimable_balance_id: Some(id),
                ..Self::default()
            },
            Some(SponsorshipSubject::Data { account, name }) => Self {
                data_account_id: Some(account_id_to_strkey(&account)),
                data_name: Some(String::from_utf8_lossy(&name).into_owned()),
                ..Self::default()
            },
            Some(SponsorshipSubject::Offer { offer_id, .. }) => Self {
                offer_id: Some(offer_id.to_string()),
                ..Self::default()
            },
            Some(SponsorshipSubject::Trustline { account, asset }) => Self {
                trustline_account_id: Some(account_id_to_strkey(&account)),
                trustline_asset: Some(asset),
                ..Self::default()
            },
            Some(SponsorshipSubject::Signer { account, signer }) => Self {
                signer_account_id: Some(account_id_to_strkey(&account)),
                signer_key: Some(signer),
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

impl OperationDetails {
    pub fn new(
        body: &OperationBody,
        source: &AccountAddress,
        outcome: &OperationOutcome,
    ) -> Result<Self> {
        Ok(match body {
            OperationBody::CreateAccount(op) => OperationDetails::CreateAccount {
                starting_balance: format_amount(op.starting_balance),
                funder: source.address(),
                account: account_id_to_strkey(&op.destination),
            },
            OperationBody::Payment(op) => {
                let to = AccountAddress::from_muxed(&op.destination);
                OperationDetails::Payment {
                    asset: AssetFields::from_asset(&op.asset),
                    from: source.address(),
                    to: to.address(),
                    to_muxed: to.muxed_address(),
                    amount: format_amount(op.amount),
                }
            }
            OperationBody::SetOptions(op) => OperationDetails::SetOptions {
                low_threshold: op.low_threshold,
                med_threshold: op.med_threshold,
                high_threshold: op.high_threshold,
                home_domain: op
                    .home_domain
                    .as_ref()
                    .map(|d| String::from_utf8_lossy(d.as_vec()).into_owned()),
                signer_key: op.signer.as_ref().map(|s| signer_key_to_strkey(&s.key)),
                signer_weight: op.signer.as_ref().map(|s| s.weight),
                master_key_weight: op.master_weight,
                set_flags: op.set_flags,
                clear_flags: op.clear_flags,
            },
            OperationBody::ChangeTrust(op) => OperationDetails::ChangeTrust {
                asset: change_trust_asset_to_string(&op.line)?,
                limit: format_amount(op.limit),
                trustor: source.address(),
            },
            OperationBody::ManageData(op) => OperationDetails::ManageData {
                name: String::from_utf8_lossy(op.data_name.as_vec()).into_owned(),
                value: op
                    .data_value
                    .as_ref()
                    .map(|v| STANDARD.encode(v.0.as_slice()))
                    .unwrap_or_default(),
            },
            OperationBody::AccountMerge(destination) => {
                let into = AccountAddress::from_muxed(destination);
                OperationDetails::AccountMerge {
                    account: source.address(),
                    into: into.address(),
                    into_muxed: into.muxed_address(),
                }
            }
            OperationBody::BumpSequence(op) => OperationDetails::BumpSequence {
                bump_to: op.bump_to.0.to_string(),
            },
            OperationBody::CreateClaimableBalance(op) => OperationDetails::CreateClaimableBalance {
                asset: asset_to_string(&op.asset),
                amount: format_amount(op.amount),
                claimants: op
                    .claimants
                    .iter()
                    .map(|claimant| {
                        let Claimant::ClaimantTypeV0(claimant) = claimant;
                        ClaimantView {
                            destination: account_id_to_strkey(&claimant.destination),
                        }
                    })
                    .collect(),
            },
            OperationBody::ClaimClaimableBalance(op) => OperationDetails::ClaimClaimableBalance {
                balance_id: claimable_balance_id_string(&op.balance_id),
                claimant: source.address(),
            },
            OperationBody::BeginSponsoringFutureReserves(op) => {
                OperationDetails::BeginSponsoringFutureReserves {
                    sponsored_id: account_id_to_strkey(&op.sponsored_id),
                }
            }
            OperationBody::EndSponsoringFutureReserves => {
                OperationDetails::EndSponsoringFutureReserves {
                    begin_sponsor: outcome
                        .closed_bracket
                        .as_ref()
                        .map(|b| account_id_to_strkey(&b.sponsor)),
                }
            }
            OperationBody::RevokeSponsorship(op) => {
                OperationDetails::RevokeSponsorship(RevokeDetails::from_op(op))
            }
            _ => OperationDetails::Other {},
        })
    }
}

/// An operation as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub id: String,
    pub paging_token: String,
    pub transaction_successful: bool,
    pub source_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_account_muxed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_account_muxed_id: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_i: i32,
    pub created_at: String,
    pub transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    #[serde(flatten)]
    pub details: OperationDetails,
}

impl OperationRecord {
    pub fn new(
        id: Toid,
        transaction_hash: &str,
        transaction_successful: bool,
        created_at: &str,
        body: &OperationBody,
        source: &AccountAddress,
        outcome: &OperationOutcome,
    ) -> Result<Self> {
        let op_type = body.discriminant();
        Ok(Self {
            id: id.to_i64().to_string(),
            paging_token: id.paging_token(),
            transaction_successful,
            source_account: source.address(),
            source_account_muxed: source.muxed_address(),
            source_account_muxed_id: source.muxed_id.map(|id| id.to_string()),
            type_name: operation_type_name(op_type).to_string(),
            type_i: op_type as i32,
            created_at: created_at.to_string(),
            transaction_hash: transaction_hash.to_string(),
            sponsor: outcome.sponsor.as_ref().map(account_id_to_strkey),
            details: OperationDetails::new(body, source, outcome)?,
        })
    }
}
