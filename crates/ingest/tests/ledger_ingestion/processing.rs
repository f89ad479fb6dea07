use super::*;

use henyey_tx::materialize;

#[test]
fn test_conservation_holds_after_every_ledger() {
    let ledgers = vec![
        ledger(10, vec![sandwich()]),
        ledger(
            11,
            vec![tx(
                SPONSOREE,
                vec![
                    begin_sponsoring(Some(SPONSOR), SPONSOREE),
                    manage_data(SPONSOREE, "a", Some(b"1")),
                    set_signer(SPONSOREE, 7, 2),
                    end_sponsoring(SPONSOREE),
                ],
            )],
        ),
        ledger(12, vec![tx(SPONSOR, vec![revoke_account(None, SPONSOREE)])]),
        ledger(13, vec![tx(SPONSOREE, vec![manage_data(SPONSOREE, "a", None)])]),
    ];

    let processor = processor();
    let mut state = LedgerState::new();
    for ledger in &ledgers {
        let (next, _) = processor.process(&state, ledger).unwrap();
        assert_eq!(next.total_num_sponsoring(), next.total_num_sponsored());
        next.check_invariants().unwrap();
        state = next;
    }
    assert_eq!(state.last_ledger(), Some(13));
    // Only the signer is still sponsored.
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 1);
}

#[test]
fn test_out_of_order_ledger_rejected() {
    let processor = processor();
    let (state, _) = processor
        .process(&LedgerState::new(), &ledger(10, vec![]))
        .unwrap();

    for sequence in [10, 12, 9] {
        let err = processor
            .process(&state, &ledger(sequence, vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::OutOfOrderLedger { expected: 11, got } if got == sequence
        ));
    }
    assert!(processor.process(&state, &ledger(11, vec![])).is_ok());
}

#[test]
fn test_gaps_allowed_without_strict_ordering() {
    let processor = processor().with_strict_ordering(false);
    let (state, _) = processor
        .process(&LedgerState::new(), &ledger(10, vec![]))
        .unwrap();
    assert!(processor.process(&state, &ledger(15, vec![])).is_ok());
    assert!(processor.process(&state, &ledger(10, vec![])).is_err());
}

#[test]
fn test_malformed_envelope_aborts_ledger() {
    let bad = RawTransaction {
        envelope_xdr: "not an envelope".to_string(),
        result_xdr: tx(SPONSOR, vec![create_account(None, OTHER)]).result_xdr,
    };
    let processor = processor();
    let (before, _) = processor
        .process(&LedgerState::new(), &ledger(9, vec![]))
        .unwrap();

    let err = processor
        .process(&before, &ledger(10, vec![sandwich(), bad]))
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Tx(henyey_tx::TxError::MalformedEnvelope(_))
    ));

    // Nothing from the ledger is kept, so it can be retried as a whole.
    assert_eq!(before.last_ledger(), Some(9));
    assert_eq!(before.total_num_sponsoring(), 0);
    let (after, _) = processor
        .process(&before, &ledger(10, vec![sandwich()]))
        .unwrap();
    assert_eq!(after.total_num_sponsoring(), 1);
}

#[test]
fn test_result_count_mismatch_is_malformed() {
    let operations = vec![create_account(None, OTHER), manage_data(SPONSOR, "k", Some(b"v"))];
    let result = success_result(&operations[..1]);
    let raw = RawTransaction::from_xdr(&v1_envelope(SPONSOR, operations), &result).unwrap();

    let err = processor()
        .process(&LedgerState::new(), &ledger(10, vec![raw]))
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::MalformedResult { tx_index: 1, .. }
    ));
}

#[test]
fn test_failed_transaction_has_operations_but_no_effects() {
    let operations = vec![
        begin_sponsoring(None, SPONSOREE),
        create_account(None, SPONSOREE),
        end_sponsoring(SPONSOREE),
    ];
    let raw = RawTransaction::from_xdr(&v1_envelope(SPONSOR, operations), &failed_result())
        .unwrap();
    let (state, output) = run(&[ledger(10, vec![raw])]);

    assert_eq!(output.transactions.len(), 1);
    assert!(!output.transactions[0].successful);
    assert_eq!(output.operations.len(), 3);
    assert!(output.operations.iter().all(|op| !op.transaction_successful));
    assert!(output.operations[1].sponsor.is_none());
    assert!(output.effects.is_empty());
    assert_eq!(state.total_num_sponsoring(), 0);
    assert!(state
        .entry(&SponsorshipSubject::Account(account_id(SPONSOREE)))
        .is_none());
}

#[test]
fn test_ids_follow_ledger_transaction_and_operation_order() {
    let first = tx(SPONSOR, vec![manage_data(SPONSOR, "a", Some(b"1"))]);
    let second = tx(
        OTHER,
        vec![
            manage_data(OTHER, "b", Some(b"2")),
            manage_data(OTHER, "c", Some(b"3")),
        ],
    );
    let (_, output) = run(&[ledger(10, vec![first, second])]);

    let ids: Vec<i64> = output
        .operations
        .iter()
        .map(|op| op.id.parse().unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(output.transactions[1].application_order, 2);
    assert!(output.transactions[0].toid < ids[0]);

    let effect = &output.effects[0];
    assert_eq!(effect.id, format!("{:019}-{:010}", ids[0], 1));
    assert_eq!(effect.created_at, "2020-09-13T12:27:30Z");
}

#[test]
fn test_fee_bump_transaction_found_by_either_hash() {
    let operations = vec![manage_data(SPONSOR, "k", Some(b"v"))];
    let result = fee_bump_success_result(&operations);
    let raw =
        RawTransaction::from_xdr(&fee_bump_envelope(OTHER, SPONSOR, operations), &result).unwrap();
    let (_, output) = run(&[ledger(10, vec![raw])]);

    let record = &output.transactions[0];
    let inner_hash = record.inner_transaction_hash.clone().unwrap();
    assert!(record.successful);
    assert_eq!(
        output.find_transaction(&inner_hash).map(|r| &r.transaction_hash),
        Some(&record.transaction_hash)
    );
    assert_eq!(output.operations[0].transaction_hash, record.transaction_hash);
    assert_eq!(effect_types(&output, &output.operations[0].id), vec!["data_created"]);

    let by_inner = materialize(&inner_hash, record).unwrap();
    let by_outer = materialize(&record.transaction_hash, record).unwrap();
    assert_eq!(by_inner.hash, inner_hash);
    assert_eq!(by_outer.hash, record.transaction_hash);
    assert_eq!(by_inner.source_account, by_outer.source_account);
    assert_eq!(by_inner.fee_account, address(OTHER));
    assert_eq!(by_inner.fee_charged, 400);
}
