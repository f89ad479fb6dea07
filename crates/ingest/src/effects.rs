//! Effects: the ordered log of state changes caused by each operation.
//!
//! Every operation first gets its primary effects (balances, signers,
//! trustlines, ...) and then the sponsorship effects produced by bracket
//! attribution, entry removal or revocation. [`EffectEmitter`] keeps the two
//! groups apart while an operation is processed and only numbers them when the
//! operation is finished, so the primary-then-sponsorship order holds no
//! matter in which order they were recorded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use henyey_common::Toid;
use henyey_crypto::{signer_key_to_strkey, xdr_sha256};
use henyey_tx::{
    account_id_to_strkey, asset_code_to_str, asset_to_string, AccountAddress, Link, TxError,
};
use serde::Serialize;
use stellar_xdr::curr::{
    AccountId, AccountMergeResult, Asset, ChangeTrustAsset, Claimant, CreateClaimableBalanceResult,
    OperationBody, OperationResult, OperationResultTr, SetOptionsOp,
};

use crate::amount::format_amount;
use crate::changes::{ChangeKind, EntryChange, OpPosition};
use crate::subject::{claimable_balance_id_string, SponsorshipSubject};
use crate::Result;

/// Asset description shared by balance and trustline effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFields {
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_pool_id: Option<String>,
}

impl AssetFields {
    pub fn from_asset(asset: &Asset) -> Self {
        match asset {
            Asset::Native => Self::plain("native", None, None),
            Asset::CreditAlphanum4(a) => Self::plain(
                "credit_alphanum4",
                Some(asset_code_to_str(&a.asset_code.0)),
                Some(account_id_to_strkey(&a.issuer)),
            ),
            Asset::CreditAlphanum12(a) => Self::plain(
                "credit_alphanum12",
                Some(asset_code_to_str(&a.asset_code.0)),
                Some(account_id_to_strkey(&a.issuer)),
            ),
        }
    }

    pub fn from_change_trust(asset: &ChangeTrustAsset) -> Result<Self> {
        Ok(match asset {
            ChangeTrustAsset::Native => Self::from_asset(&Asset::Native),
            ChangeTrustAsset::CreditAlphanum4(a) => {
                Self::from_asset(&Asset::CreditAlphanum4(a.clone()))
            }
            ChangeTrustAsset::CreditAlphanum12(a) => {
                Self::from_asset(&Asset::CreditAlphanum12(a.clone()))
            }
            ChangeTrustAsset::PoolShare(params) => {
                let pool_id = xdr_sha256(params).map_err(TxError::from)?;
                Self {
                    asset_type: "liquidity_pool_shares".to_string(),
                    asset_code: None,
                    asset_issuer: None,
                    liquidity_pool_id: Some(pool_id.to_hex()),
                }
            }
        })
    }

    fn plain(asset_type: &str, code: Option<String>, issuer: Option<String>) -> Self {
        Self {
            asset_type: asset_type.to_string(),
            asset_code: code,
            asset_issuer: issuer,
            liquidity_pool_id: None,
        }
    }
}

/// Typed payload of an effect, tagged by its `type` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectDetails {
    AccountCreated {
        starting_balance: String,
    },
    AccountRemoved {},
    AccountCredited {
        amount: String,
        #[serde(flatten)]
        asset: AssetFields,
    },
    AccountDebited {
        amount: String,
        #[serde(flatten)]
        asset: AssetFields,
    },
    AccountThresholdsUpdated {
        #[serde(skip_serializing_if = "Option::is_none")]
        low_threshold: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        med_threshold: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        high_threshold: Option<u32>,
    },
    AccountHomeDomainUpdated {
        home_domain: String,
    },
    AccountFlagsUpdated {
        #[serde(skip_serializing_if = "Option::is_none")]
        auth_required_flag: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth_revocable_flag: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth_immutable_flag: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth_clawback_enabled_flag: Option<bool>,
    },
    SignerCreated {
        weight: u32,
        public_key: String,
        key: String,
    },
    SignerRemoved {
        weight: u32,
        public_key: String,
        key: String,
    },
    SignerUpdated {
        weight: u32,
        public_key: String,
        key: String,
    },
    TrustlineCreated {
        limit: String,
        #[serde(flatten)]
        asset: AssetFields,
    },
    TrustlineRemoved {
        limit: String,
        #[serde(flatten)]
        asset: AssetFields,
    },
    TrustlineUpdated {
        limit: String,
        #[serde(flatten)]
        asset: AssetFields,
    },
    DataCreated {
        name: String,
        value: String,
    },
    DataRemoved {
        name: String,
    },
    DataUpdated {
        name: String,
        value: String,
    },
    SequenceBumped {
        new_seq: String,
    },
    ClaimableBalanceCreated {
        balance_id: String,
        asset: String,
        amount: String,
    },
    ClaimableBalanceClaimantCreated {
        balance_id: String,
        asset: String,
        amount: String,
    },
    ClaimableBalanceClaimed {
        balance_id: String,
    },
    ClaimableBalanceClawedBack {
        balance_id: String,
    },

    AccountSponsorshipCreated {
        sponsor: String,
    },
    AccountSponsorshipUpdated {
        former_sponsor: String,
        new_sponsor: String,
    },
    AccountSponsorshipRemoved {
        former_sponsor: String,
    },
    SignerSponsorshipCreated {
        signer: String,
        sponsor: String,
    },
    SignerSponsorshipUpdated {
        signer: String,
        former_sponsor: String,
        new_sponsor: String,
    },
    SignerSponsorshipRemoved {
        signer: String,
        former_sponsor: String,
    },
    TrustlineSponsorshipCreated {
        asset: String,
        sponsor: String,
    },
    TrustlineSponsorshipUpdated {
        asset: String,
        former_sponsor: String,
        new_sponsor: String,
    },
    TrustlineSponsorshipRemoved {
        asset: String,
        former_sponsor: String,
    },
    OfferSponsorshipCreated {
        offer_id: String,
        sponsor: String,
    },
    OfferSponsorshipUpdated {
        offer_id: String,
        former_sponsor: String,
        new_sponsor: String,
    },
    OfferSponsorshipRemoved {
        offer_id: String,
        former_sponsor: String,
    },
    DataSponsorshipCreated {
        data_name: String,
        sponsor: String,
    },
    DataSponsorshipUpdated {
        data_name: String,
        former_sponsor: String,
        new_sponsor: String,
    },
    DataSponsorshipRemoved {
        data_name: String,
        former_sponsor: String,
    },
    ClaimableBalanceSponsorshipCreated {
        balance_id: String,
        sponsor: String,
    },
    ClaimableBalanceSponsorshipUpdated {
        balance_id: String,
        former_sponsor: String,
        new_sponsor: String,
    },
    ClaimableBalanceSponsorshipRemoved {
        balance_id: String,
        former_sponsor: String,
    },
}

/// A change to the sponsorship of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SponsorshipEvent {
    Created { sponsor: AccountId },
    Updated { former_sponsor: AccountId, new_sponsor: AccountId },
    Removed { former_sponsor: AccountId },
}

impl EffectDetails {
    /// The `<kind>_sponsorship_<event>` effect for a subject.
    pub fn sponsorship(subject: &SponsorshipSubject, event: &SponsorshipEvent) -> Self {
        use SponsorshipEvent::*;
        use SponsorshipSubject as S;

        let strkey = account_id_to_strkey;
        match (subject, event) {
            (S::Account(_), Created { sponsor }) => Self::AccountSponsorshipCreated {
                sponsor: strkey(sponsor),
            },
            (S::Account(_), Updated { former_sponsor, new_sponsor }) => {
                Self::AccountSponsorshipUpdated {
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::Account(_), Removed { former_sponsor }) => Self::AccountSponsorshipRemoved {
                former_sponsor: strkey(former_sponsor),
            },
            (S::Signer { signer, .. }, Created { sponsor }) => Self::SignerSponsorshipCreated {
                signer: signer.clone(),
                sponsor: strkey(sponsor),
            },
            (S::Signer { signer, .. }, Updated { former_sponsor, new_sponsor }) => {
                Self::SignerSponsorshipUpdated {
                    signer: signer.clone(),
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::Signer { signer, .. }, Removed { former_sponsor }) => {
                Self::SignerSponsorshipRemoved {
                    signer: signer.clone(),
                    former_sponsor: strkey(former_sponsor),
                }
            }
            (S::Trustline { asset, .. }, Created { sponsor }) => {
                Self::TrustlineSponsorshipCreated {
                    asset: asset.clone(),
                    sponsor: strkey(sponsor),
                }
            }
            (S::Trustline { asset, .. }, Updated { former_sponsor, new_sponsor }) => {
                Self::TrustlineSponsorshipUpdated {
                    asset: asset.clone(),
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::Trustline { asset, .. }, Removed { former_sponsor }) => {
                Self::TrustlineSponsorshipRemoved {
                    asset: asset.clone(),
                    former_sponsor: strkey(former_sponsor),
                }
            }
            (S::Offer { offer_id, .. }, Created { sponsor }) => Self::OfferSponsorshipCreated {
                offer_id: offer_id.to_string(),
                sponsor: strkey(sponsor),
            },
            (S::Offer { offer_id, .. }, Updated { former_sponsor, new_sponsor }) => {
                Self::OfferSponsorshipUpdated {
                    offer_id: offer_id.to_string(),
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::Offer { offer_id, .. }, Removed { former_sponsor }) => {
                Self::OfferSponsorshipRemoved {
                    offer_id: offer_id.to_string(),
                    former_sponsor: strkey(former_sponsor),
                }
            }
            (S::Data { name, .. }, Created { sponsor }) => Self::DataSponsorshipCreated {
                data_name: String::from_utf8_lossy(name).into_owned(),
                sponsor: strkey(sponsor),
            },
            (S::Data { name, .. }, Updated { former_sponsor, new_sponsor }) => {
                Self::DataSponsorshipUpdated {
                    data_name: String::from_utf8_lossy(name).into_owned(),
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::Data { name, .. }, Removed { former_sponsor }) => Self::DataSponsorshipRemoved {
                data_name: String::from_utf8_lossy(name).into_owned(),
                former_sponsor: strkey(former_sponsor),
            },
            (S::ClaimableBalance(id), Created { sponsor }) => {
                Self::ClaimableBalanceSponsorshipCreated {
                    balance_id: id.clone(),
                    sponsor: strkey(sponsor),
                }
            }
            (S::ClaimableBalance(id), Updated { former_sponsor, new_sponsor }) => {
                Self::ClaimableBalanceSponsorshipUpdated {
                    balance_id: id.clone(),
                    former_sponsor: strkey(former_sponsor),
                    new_sponsor: strkey(new_sponsor),
                }
            }
            (S::ClaimableBalance(id), Removed { former_sponsor }) => {
                Self::ClaimableBalanceSponsorshipRemoved {
                    balance_id: id.clone(),
                    former_sponsor: strkey(former_sponsor),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectLinks {
    pub operation: Link,
}

/// One entry of the effect log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Effect {
    #[serde(rename = "_links")]
    pub links: EffectLinks,
    pub id: String,
    pub paging_token: String,
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_muxed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_muxed_id: Option<String>,
    pub created_at: String,
    #[serde(flatten)]
    pub details: EffectDetails,
    /// Id of the owning operation.
    #[serde(skip)]
    pub operation_id: i64,
    /// 1-based position within the operation.
    #[serde(skip)]
    pub order: u32,
}

/// Collects the effects of one operation.
#[derive(Debug)]
pub struct EffectEmitter {
    operation: Toid,
    created_at: String,
    primary: Vec<(AccountAddress, EffectDetails)>,
    sponsorship: Vec<(AccountAddress, EffectDetails)>,
}

impl EffectEmitter {
    pub fn new(operation: Toid, created_at: String) -> Self {
        Self {
            operation,
            created_at,
            primary: Vec::new(),
            sponsorship: Vec::new(),
        }
    }

    pub fn primary(&mut self, account: AccountAddress, details: EffectDetails) {
        self.primary.push((account, details));
    }

    /// Records a sponsorship effect on the entry owner's log.
    pub fn sponsorship(
        &mut self,
        owner: &AccountId,
        subject: &SponsorshipSubject,
        event: &SponsorshipEvent,
    ) {
        self.sponsorship.push((
            AccountAddress::from_account_id(owner.clone()),
            EffectDetails::sponsorship(subject, event),
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.sponsorship.is_empty()
    }

    /// Numbers the effects, primary ones first.
    pub fn finish(self) -> Vec<Effect> {
        let operation_id = self.operation.to_i64();
        let href = format!("/operations/{}", operation_id);
        self.primary
            .into_iter()
            .chain(self.sponsorship)
            .zip(1u32..)
            .map(|((account, details), order)| {
                let id = self.operation.effect_id(order);
                Effect {
                    links: EffectLinks {
                        operation: Link::new(href.clone()),
                    },
                    paging_token: id.clone(),
                    id,
                    account: account.address(),
                    account_muxed: account.muxed_address(),
                    account_muxed_id: account.muxed_id.map(|id| id.to_string()),
                    created_at: self.created_at.clone(),
                    details,
                    operation_id,
                    order,
                }
            })
            .collect()
    }
}

const AUTH_REQUIRED: u32 = 0x1;
const AUTH_REVOCABLE: u32 = 0x2;
const AUTH_IMMUTABLE: u32 = 0x4;
const AUTH_CLAWBACK_ENABLED: u32 = 0x8;

/// Emits the primary effects of a successful operation.
///
/// `changes` are the entry changes of the same operation; they decide between
/// created and updated effects for entries that may already exist.
pub fn emit_primary_effects(
    emitter: &mut EffectEmitter,
    body: &OperationBody,
    source: &AccountAddress,
    result: &OperationResult,
    changes: &[EntryChange],
    position: OpPosition,
) -> Result<()> {
    let created = |subject: &SponsorshipSubject| {
        changes
            .iter()
            .any(|c| &c.subject == subject && c.kind == ChangeKind::Created)
    };

    match body {
        OperationBody::CreateAccount(op) => {
            let destination = AccountAddress::from_account_id(op.destination.clone());
            emitter.primary(
                destination.clone(),
                EffectDetails::AccountCreated {
                    starting_balance: format_amount(op.starting_balance),
                },
            );
            emitter.primary(
                source.clone(),
                EffectDetails::AccountDebited {
                    amount: format_amount(op.starting_balance),
                    asset: AssetFields::from_asset(&Asset::Native),
                },
            );
            emitter.primary(
                destination.clone(),
                EffectDetails::SignerCreated {
                    weight: 1,
                    public_key: destination.address(),
                    key: String::new(),
                },
            );
        }
        OperationBody::Payment(op) => {
            let asset = AssetFields::from_asset(&op.asset);
            emitter.primary(
                AccountAddress::from_muxed(&op.destination),
                EffectDetails::AccountCredited {
                    amount: format_amount(op.amount),
                    asset: asset.clone(),
                },
            );
            emitter.primary(
                source.clone(),
                EffectDetails::AccountDebited {
                    amount: format_amount(op.amount),
                    asset,
                },
            );
        }
        OperationBody::SetOptions(op) => {
            emit_set_options(emitter, op, source, changes);
        }
        OperationBody::ChangeTrust(op) => {
            let asset = AssetFields::from_change_trust(&op.line)?;
            let limit = format_amount(op.limit);
            let details = if op.limit == 0 {
                EffectDetails::TrustlineRemoved { limit, asset }
            } else if changes.iter().any(|c| c.kind == ChangeKind::Created) {
                EffectDetails::TrustlineCreated { limit, asset }
            } else {
                EffectDetails::TrustlineUpdated { limit, asset }
            };
            emitter.primary(source.clone(), details);
        }
        OperationBody::ManageData(op) => {
            let name = String::from_utf8_lossy(op.data_name.as_vec()).into_owned();
            let details = match &op.data_value {
                None => EffectDetails::DataRemoved { name },
                Some(value) => {
                    let value = STANDARD.encode(value.0.as_slice());
                    if created(&SponsorshipSubject::data(
                        source.account_id.clone(),
                        op.data_name.as_vec(),
                    )) {
                        EffectDetails::DataCreated { name, value }
                    } else {
                        EffectDetails::DataUpdated { name, value }
                    }
                }
            };
            emitter.primary(source.clone(), details);
        }
        OperationBody::AccountMerge(destination) => {
            let amount = match result {
                OperationResult::OpInner(OperationResultTr::AccountMerge(
                    AccountMergeResult::Success(amount),
                )) => *amount,
                _ => {
                    return Err(crate::IngestError::UnexpectedOperationResult {
                        tx_index: position.tx_index,
                        op_index: position.op_index,
                    })
                }
            };
            let native = AssetFields::from_asset(&Asset::Native);
            emitter.primary(
                source.clone(),
                EffectDetails::AccountDebited {
                    amount: format_amount(amount),
                    asset: native.clone(),
                },
            );
            emitter.primary(
                AccountAddress::from_muxed(destination),
                EffectDetails::AccountCredited {
                    amount: format_amount(amount),
                    asset: native,
                },
            );
            emitter.primary(source.clone(), EffectDetails::AccountRemoved {});
        }
        OperationBody::BumpSequence(op) => {
            emitter.primary(
                source.clone(),
                EffectDetails::SequenceBumped {
                    new_seq: op.bump_to.0.to_string(),
                },
            );
        }
        OperationBody::CreateClaimableBalance(op) => {
            let balance_id = match result {
                OperationResult::OpInner(OperationResultTr::CreateClaimableBalance(
                    CreateClaimableBalanceResult::Success(id),
                )) => claimable_balance_id_string(id),
                _ => {
                    return Err(crate::IngestError::UnexpectedOperationResult {
                        tx_index: position.tx_index,
                        op_index: position.op_index,
                    })
                }
            };
            let asset = asset_to_string(&op.asset);
            let amount = format_amount(op.amount);
            emitter.primary(
                source.clone(),
                EffectDetails::ClaimableBalanceCreated {
                    balance_id: balance_id.clone(),
                    asset: asset.clone(),
                    amount: amount.clone(),
                },
            );
            for claimant in op.claimants.iter() {
                let Claimant::ClaimantTypeV0(claimant) = claimant;
                emitter.primary(
                    AccountAddress::from_account_id(claimant.destination.clone()),
                    EffectDetails::ClaimableBalanceClaimantCreated {
                        balance_id: balance_id.clone(),
                        asset: asset.clone(),
                        amount: amount.clone(),
                    },
                );
            }
            emitter.primary(
                source.clone(),
                EffectDetails::AccountDebited {
                    amount,
                    asset: AssetFields::from_asset(&op.asset),
                },
            );
        }
        OperationBody::ClaimClaimableBalance(op) => {
            emitter.primary(
                source.clone(),
                EffectDetails::ClaimableBalanceClaimed {
                    balance_id: claimable_balance_id_string(&op.balance_id),
                },
            );
        }
        OperationBody::ClawbackClaimableBalance(op) => {
            emitter.primary(
                source.clone(),
                EffectDetails::ClaimableBalanceClawedBack {
                    balance_id: claimable_balance_id_string(&op.balance_id),
                },
            );
        }
        _ => {}
    }
    Ok(())
}

fn emit_set_options(
    emitter: &mut EffectEmitter,
    op: &SetOptionsOp,
    source: &AccountAddress,
    changes: &[EntryChange],
) {
    if let Some(home_domain) = &op.home_domain {
        emitter.primary(
            source.clone(),
            EffectDetails::AccountHomeDomainUpdated {
                home_domain: String::from_utf8_lossy(home_domain.as_vec()).into_owned(),
            },
        );
    }

    if op.low_threshold.is_some() || op.med_threshold.is_some() || op.high_threshold.is_some() {
        emitter.primary(
            source.clone(),
            EffectDetails::AccountThresholdsUpdated {
                low_threshold: op.low_threshold,
                med_threshold: op.med_threshold,
                high_threshold: op.high_threshold,
            },
        );
    }

    if op.set_flags.is_some() || op.clear_flags.is_some() {
        let flag = |bit: u32| {
            if op.set_flags.is_some_and(|f| f & bit != 0) {
                Some(true)
            } else if op.clear_flags.is_some_and(|f| f & bit != 0) {
                Some(false)
            } else {
                None
            }
        };
        emitter.primary(
            source.clone(),
            EffectDetails::AccountFlagsUpdated {
                auth_required_flag: flag(AUTH_REQUIRED),
                auth_revocable_flag: flag(AUTH_REVOCABLE),
                auth_immutable_flag: flag(AUTH_IMMUTABLE),
                auth_clawback_enabled_flag: flag(AUTH_CLAWBACK_ENABLED),
            },
        );
    }

    if let Some(weight) = op.master_weight {
        let public_key = source.address();
        let details = if weight == 0 {
            EffectDetails::SignerRemoved {
                weight,
                public_key,
                key: String::new(),
            }
        } else {
            EffectDetails::SignerUpdated {
                weight,
                public_key,
                key: String::new(),
            }
        };
        emitter.primary(source.clone(), details);
    }

    if let Some(signer) = &op.signer {
        let key = signer_key_to_strkey(&signer.key);
        let subject = SponsorshipSubject::Signer {
            account: source.account_id.clone(),
            signer: key.clone(),
        };
        let kind = changes
            .iter()
            .find(|c| c.subject == subject)
            .map(|c| c.kind);
        let weight = signer.weight;
        let details = match kind {
            // Removing a signer the account never had changes nothing.
            None if weight == 0 => return,
            Some(ChangeKind::Removed) => EffectDetails::SignerRemoved {
                weight,
                public_key: key.clone(),
                key,
            },
            Some(ChangeKind::Created) => EffectDetails::SignerCreated {
                weight,
                public_key: key.clone(),
                key,
            },
            _ => EffectDetails::SignerUpdated {
                weight,
                public_key: key.clone(),
                key,
            },
        };
        emitter.primary(source.clone(), details);
    }
}
