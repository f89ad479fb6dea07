//! Ledger ingestion scenarios: sponsorship brackets, revocation, offer
//! crossing, and all-or-nothing ledger processing.

use henyey_common::NetworkId;
use henyey_ingest::{
    EffectDetails, IngestError, LedgerOutput, LedgerProcessor, LedgerState, RawLedger,
    RawTransaction, SponsorshipSubject,
};
use henyey_tx::account_id_to_strkey;
use stellar_xdr::curr::{
    AccountId, AccountMergeResult, AlphaNum4, Asset, AssetCode4,
    BeginSponsoringFutureReservesOp, BeginSponsoringFutureReservesResult, ChangeTrustAsset,
    ChangeTrustOp, ChangeTrustResult, ClaimAtom, ClaimClaimableBalanceOp,
    ClaimClaimableBalanceResult, ClaimOfferAtom, ClaimPredicate, ClaimableBalanceId, Claimant,
    ClaimantV0, CreateAccountOp, CreateAccountResult, CreateClaimableBalanceOp,
    CreateClaimableBalanceResult, DecoratedSignature, EndSponsoringFutureReservesResult,
    FeeBumpTransaction, FeeBumpTransactionEnvelope, FeeBumpTransactionExt,
    FeeBumpTransactionInnerTx, Hash, InnerTransactionResult, InnerTransactionResultExt,
    InnerTransactionResultPair, InnerTransactionResultResult, LedgerKey, LedgerKeyAccount,
    LedgerKeyClaimableBalance, LedgerKeyData, LedgerKeyOffer, LedgerKeyTrustLine, ManageDataOp,
    ManageDataResult, ManageOfferSuccessResult, ManageOfferSuccessResultOffer,
    ManageSellOfferOp, ManageSellOfferResult, Memo, MuxedAccount, OfferEntry, OfferEntryExt,
    Operation, OperationBody, OperationResult, OperationResultTr, Preconditions, Price,
    PublicKey, RevokeSponsorshipOp, RevokeSponsorshipOpSigner, RevokeSponsorshipResult,
    SequenceNumber, SetOptionsOp, SetOptionsResult, Signature, SignatureHint, Signer, SignerKey,
    Transaction, TransactionEnvelope, TransactionExt, TransactionResult, TransactionResultExt,
    TransactionResultResult, TransactionV1Envelope, TrustLineAsset, Uint256,
};

mod offers;
mod processing;
mod sponsorship;

const SPONSOR: u8 = 1;
const SPONSOREE: u8 = 2;
const OTHER: u8 = 3;
const CLOSE_TIME: u64 = 1_600_000_000;

fn account_id(seed: u8) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([seed; 32])))
}

fn address(seed: u8) -> String {
    account_id_to_strkey(&account_id(seed))
}

fn muxed(seed: u8) -> MuxedAccount {
    MuxedAccount::Ed25519(Uint256([seed; 32]))
}

fn op(source: Option<u8>, body: OperationBody) -> Operation {
    Operation {
        source_account: source.map(muxed),
        body,
    }
}

fn begin_sponsoring(source: Option<u8>, sponsored: u8) -> Operation {
    op(
        source,
        OperationBody::BeginSponsoringFutureReserves(BeginSponsoringFutureReservesOp {
            sponsored_id: account_id(sponsored),
        }),
    )
}

fn end_sponsoring(source: u8) -> Operation {
    op(Some(source), OperationBody::EndSponsoringFutureReserves)
}

fn create_account(source: Option<u8>, destination: u8) -> Operation {
    op(
        source,
        OperationBody::CreateAccount(CreateAccountOp {
            destination: account_id(destination),
            starting_balance: 15_000_000,
        }),
    )
}

fn manage_data(source: u8, name: &str, value: Option<&[u8]>) -> Operation {
    op(
        Some(source),
        OperationBody::ManageData(ManageDataOp {
            data_name: name.as_bytes().to_vec().try_into().unwrap(),
            data_value: value.map(|v| v.to_vec().try_into().unwrap()),
        }),
    )
}

fn set_signer(source: u8, key: u8, weight: u32) -> Operation {
    op(
        Some(source),
        OperationBody::SetOptions(SetOptionsOp {
            inflation_dest: None,
            clear_flags: None,
            set_flags: None,
            master_weight: None,
            low_threshold: None,
            med_threshold: None,
            high_threshold: None,
            home_domain: None,
            signer: Some(Signer {
                key: SignerKey::Ed25519(Uint256([key; 32])),
                weight,
            }),
        }),
    )
}

fn revoke_entry(source: Option<u8>, key: LedgerKey) -> Operation {
    op(
        source,
        OperationBody::RevokeSponsorship(RevokeSponsorshipOp::LedgerEntry(key)),
    )
}

fn revoke_account(source: Option<u8>, subject: u8) -> Operation {
    revoke_entry(
        source,
        LedgerKey::Account(LedgerKeyAccount {
            account_id: account_id(subject),
        }),
    )
}

fn revoke_signer(source: Option<u8>, account: u8, key: u8) -> Operation {
    op(
        source,
        OperationBody::RevokeSponsorship(RevokeSponsorshipOp::Signer(
            RevokeSponsorshipOpSigner {
                account_id: account_id(account),
                signer_key: SignerKey::Ed25519(Uint256([key; 32])),
            },
        )),
    )
}

fn revoke_trustline(source: Option<u8>, account: u8, issuer: u8) -> Operation {
    revoke_entry(
        source,
        LedgerKey::Trustline(LedgerKeyTrustLine {
            account_id: account_id(account),
            asset: TrustLineAsset::CreditAlphanum4(usd(issuer)),
        }),
    )
}

fn revoke_offer(source: Option<u8>, seller: u8, offer_id: i64) -> Operation {
    revoke_entry(
        source,
        LedgerKey::Offer(LedgerKeyOffer {
            seller_id: account_id(seller),
            offer_id,
        }),
    )
}

fn revoke_data(source: Option<u8>, account: u8, name: &str) -> Operation {
    revoke_entry(
        source,
        LedgerKey::Data(LedgerKeyData {
            account_id: account_id(account),
            data_name: name.as_bytes().to_vec().try_into().unwrap(),
        }),
    )
}

fn revoke_balance(source: Option<u8>, seed: u8) -> Operation {
    revoke_entry(
        source,
        LedgerKey::ClaimableBalance(LedgerKeyClaimableBalance {
            balance_id: balance_id(seed),
        }),
    )
}

fn usd(issuer: u8) -> AlphaNum4 {
    AlphaNum4 {
        asset_code: AssetCode4(*b"USD\0"),
        issuer: account_id(issuer),
    }
}

fn change_trust(source: u8, issuer: u8, limit: i64) -> Operation {
    op(
        Some(source),
        OperationBody::ChangeTrust(ChangeTrustOp {
            line: ChangeTrustAsset::CreditAlphanum4(usd(issuer)),
            limit,
        }),
    )
}

fn manage_sell_offer(source: u8, offer_id: i64, amount: i64) -> Operation {
    op(
        Some(source),
        OperationBody::ManageSellOffer(ManageSellOfferOp {
            selling: Asset::Native,
            buying: Asset::CreditAlphanum4(usd(OTHER)),
            amount,
            price: Price { n: 1, d: 1 },
            offer_id,
        }),
    )
}

fn offer_entry(seller: u8, offer_id: i64, amount: i64) -> OfferEntry {
    OfferEntry {
        seller_id: account_id(seller),
        offer_id,
        selling: Asset::Native,
        buying: Asset::CreditAlphanum4(usd(OTHER)),
        amount,
        price: Price { n: 1, d: 1 },
        flags: 0,
        ext: OfferEntryExt::V0,
    }
}

/// A fill of `amount_sold` against a resting offer.
fn claim(seller: u8, offer_id: i64, amount_sold: i64) -> ClaimAtom {
    ClaimAtom::OrderBook(ClaimOfferAtom {
        seller_id: account_id(seller),
        offer_id,
        asset_sold: Asset::Native,
        amount_sold,
        asset_bought: Asset::CreditAlphanum4(usd(OTHER)),
        amount_bought: amount_sold,
    })
}

fn offer_result(offer: ManageOfferSuccessResultOffer, claims: Vec<ClaimAtom>) -> OperationResult {
    OperationResult::OpInner(OperationResultTr::ManageSellOffer(
        ManageSellOfferResult::Success(ManageOfferSuccessResult {
            offers_claimed: claims.try_into().unwrap(),
            offer,
        }),
    ))
}

fn balance_id(seed: u8) -> ClaimableBalanceId {
    ClaimableBalanceId::ClaimableBalanceIdTypeV0(Hash([seed; 32]))
}

fn create_claimable_balance(source: u8, claimant: u8) -> Operation {
    op(
        Some(source),
        OperationBody::CreateClaimableBalance(CreateClaimableBalanceOp {
            asset: Asset::Native,
            amount: 10_000_000,
            claimants: vec![Claimant::ClaimantTypeV0(ClaimantV0 {
                destination: account_id(claimant),
                predicate: ClaimPredicate::Unconditional,
            })]
            .try_into()
            .unwrap(),
        }),
    )
}

fn balance_created(seed: u8) -> OperationResult {
    OperationResult::OpInner(OperationResultTr::CreateClaimableBalance(
        CreateClaimableBalanceResult::Success(balance_id(seed)),
    ))
}

fn claim_balance(source: u8, seed: u8) -> Operation {
    op(
        Some(source),
        OperationBody::ClaimClaimableBalance(ClaimClaimableBalanceOp {
            balance_id: balance_id(seed),
        }),
    )
}

fn account_merge(source: u8, destination: u8) -> Operation {
    op(Some(source), OperationBody::AccountMerge(muxed(destination)))
}

/// The success result an operation reports.
fn op_success(operation: &Operation) -> OperationResult {
    let tr = match &operation.body {
        OperationBody::CreateAccount(_) => {
            OperationResultTr::CreateAccount(CreateAccountResult::Success)
        }
        OperationBody::BeginSponsoringFutureReserves(_) => {
            OperationResultTr::BeginSponsoringFutureReserves(
                BeginSponsoringFutureReservesResult::Success,
            )
        }
        OperationBody::EndSponsoringFutureReserves => {
            OperationResultTr::EndSponsoringFutureReserves(
                EndSponsoringFutureReservesResult::Success,
            )
        }
        OperationBody::RevokeSponsorship(_) => {
            OperationResultTr::RevokeSponsorship(RevokeSponsorshipResult::Success)
        }
        OperationBody::SetOptions(_) => OperationResultTr::SetOptions(SetOptionsResult::Success),
        OperationBody::ManageData(_) => OperationResultTr::ManageData(ManageDataResult::Success),
        OperationBody::AccountMerge(_) => {
            OperationResultTr::AccountMerge(AccountMergeResult::Success(10_000_000))
        }
        OperationBody::ChangeTrust(_) => OperationResultTr::ChangeTrust(ChangeTrustResult::Success),
        OperationBody::ClaimClaimableBalance(_) => {
            OperationResultTr::ClaimClaimableBalance(ClaimClaimableBalanceResult::Success)
        }
        other => panic!("no fixture result for {:?}", other.discriminant()),
    };
    OperationResult::OpInner(tr)
}

fn sig(byte: u8) -> DecoratedSignature {
    DecoratedSignature {
        hint: SignatureHint([byte; 4]),
        signature: Signature(vec![byte; 64].try_into().unwrap()),
    }
}

fn transaction(source: u8, operations: Vec<Operation>) -> Transaction {
    Transaction {
        source_account: muxed(source),
        fee: 100 * operations.len() as u32,
        seq_num: SequenceNumber(1),
        cond: Preconditions::None,
        memo: Memo::None,
        operations: operations.try_into().unwrap(),
        ext: TransactionExt::V0,
    }
}

fn v1_envelope(source: u8, operations: Vec<Operation>) -> TransactionEnvelope {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx: transaction(source, operations),
        signatures: vec![sig(source)].try_into().unwrap(),
    })
}

fn fee_bump_envelope(
    fee_source: u8,
    inner_source: u8,
    operations: Vec<Operation>,
) -> TransactionEnvelope {
    TransactionEnvelope::TxFeeBump(FeeBumpTransactionEnvelope {
        tx: FeeBumpTransaction {
            fee_source: muxed(fee_source),
            fee: 10_000,
            inner_tx: FeeBumpTransactionInnerTx::Tx(TransactionV1Envelope {
                tx: transaction(inner_source, operations),
                signatures: vec![sig(inner_source)].try_into().unwrap(),
            }),
            ext: FeeBumpTransactionExt::V0,
        },
        signatures: vec![sig(fee_source)].try_into().unwrap(),
    })
}

fn success_result(operations: &[Operation]) -> TransactionResult {
    TransactionResult {
        fee_charged: 100 * operations.len() as i64,
        result: TransactionResultResult::TxSuccess(
            operations
                .iter()
                .map(op_success)
                .collect::<Vec<_>>()
                .try_into()
                .unwrap(),
        ),
        ext: TransactionResultExt::V0,
    }
}

fn fee_bump_success_result(operations: &[Operation]) -> TransactionResult {
    TransactionResult {
        fee_charged: 400,
        result: TransactionResultResult::TxFeeBumpInnerSuccess(InnerTransactionResultPair {
            transaction_hash: Hash([0; 32]),
            result: InnerTransactionResult {
                fee_charged: 300,
                result: InnerTransactionResultResult::TxSuccess(
                    operations
                        .iter()
                        .map(op_success)
                        .collect::<Vec<_>>()
                        .try_into()
                        .unwrap(),
                ),
                ext: InnerTransactionResultExt::V0,
            },
        }),
        ext: TransactionResultExt::V0,
    }
}

fn failed_result() -> TransactionResult {
    TransactionResult {
        fee_charged: 100,
        result: TransactionResultResult::TxFailed(Vec::new().try_into().unwrap()),
        ext: TransactionResultExt::V0,
    }
}

/// A successful transaction from `source`.
fn tx(source: u8, operations: Vec<Operation>) -> RawTransaction {
    let result = success_result(&operations);
    RawTransaction::from_xdr(&v1_envelope(source, operations), &result).unwrap()
}

/// A successful transaction whose operations carry the given results.
fn tx_with_results(source: u8, operations: Vec<(Operation, OperationResult)>) -> RawTransaction {
    let (operations, results): (Vec<_>, Vec<_>) = operations.into_iter().unzip();
    let result = TransactionResult {
        fee_charged: 100 * operations.len() as i64,
        result: TransactionResultResult::TxSuccess(results.try_into().unwrap()),
        ext: TransactionResultExt::V0,
    };
    RawTransaction::from_xdr(&v1_envelope(source, operations), &result).unwrap()
}

/// Pairs each operation with its plain success result.
fn succeeded(operations: Vec<Operation>) -> Vec<(Operation, OperationResult)> {
    operations
        .into_iter()
        .map(|operation| {
            let result = op_success(&operation);
            (operation, result)
        })
        .collect()
}

fn ledger(sequence: u32, transactions: Vec<RawTransaction>) -> RawLedger {
    RawLedger {
        sequence,
        close_time: CLOSE_TIME + u64::from(sequence) * 5,
        transactions,
    }
}

fn processor() -> LedgerProcessor {
    LedgerProcessor::new(NetworkId::testnet())
}

/// `begin(A) -> createAccount(A) -> end(source = A)`, submitted by the sponsor.
fn sandwich() -> RawTransaction {
    tx(
        SPONSOR,
        vec![
            begin_sponsoring(None, SPONSOREE),
            create_account(None, SPONSOREE),
            end_sponsoring(SPONSOREE),
        ],
    )
}

/// SPONSOREE's `operations` inside a bracket paid by SPONSOR.
fn sponsored(operations: Vec<(Operation, OperationResult)>) -> RawTransaction {
    let mut all = succeeded(vec![begin_sponsoring(Some(SPONSOR), SPONSOREE)]);
    all.extend(operations);
    all.extend(succeeded(vec![end_sponsoring(SPONSOREE)]));
    tx_with_results(SPONSOREE, all)
}

/// Processes ledgers in order from an empty state.
fn run(ledgers: &[RawLedger]) -> (LedgerState, LedgerOutput) {
    processor()
        .process_all(&LedgerState::new(), ledgers)
        .unwrap()
}

fn effect_types(output: &LedgerOutput, operation_id: &str) -> Vec<String> {
    let id: i64 = operation_id.parse().unwrap();
    output
        .effects_for_operation(id)
        .iter()
        .map(|e| serde_json::to_value(e).unwrap()["type"].as_str().unwrap().to_string())
        .collect()
}
