use super::*;

#[test]
fn test_sandwich_create_account_has_four_effects() {
    let (_, output) = run(&[ledger(10, vec![sandwich()])]);
    assert_eq!(output.operations.len(), 3);

    let create = &output.operations[1];
    assert_eq!(
        effect_types(&output, &create.id),
        vec![
            "account_created",
            "account_debited",
            "signer_created",
            "account_sponsorship_created",
        ]
    );

    let effects = output.effects_for_operation(create.id.parse().unwrap());
    let last = effects[3];
    assert_eq!(
        last.details,
        EffectDetails::AccountSponsorshipCreated {
            sponsor: address(SPONSOR)
        }
    );
    assert_eq!(last.account, address(SPONSOREE));
    assert_eq!(last.order, 4);

    // Begin and end produce no effects of their own.
    assert!(effect_types(&output, &output.operations[0].id).is_empty());
    assert!(effect_types(&output, &output.operations[2].id).is_empty());
}

#[test]
fn test_sandwich_operation_fields() {
    let (_, output) = run(&[ledger(10, vec![sandwich()])]);

    let begin = serde_json::to_value(&output.operations[0]).unwrap();
    assert_eq!(begin["type"], "begin_sponsoring_future_reserves");
    assert_eq!(begin["sponsored_id"], address(SPONSOREE));

    let create = serde_json::to_value(&output.operations[1]).unwrap();
    assert_eq!(create["sponsor"], address(SPONSOR));
    assert_eq!(create["account"], address(SPONSOREE));
    assert_eq!(create["funder"], address(SPONSOR));

    let end = serde_json::to_value(&output.operations[2]).unwrap();
    assert_eq!(end["type"], "end_sponsoring_future_reserves");
    assert_eq!(end["begin_sponsor"], address(SPONSOR));
    assert_eq!(end["source_account"], address(SPONSOREE));
}

#[test]
fn test_sandwich_counters_and_participants() {
    let (state, output) = run(&[ledger(10, vec![sandwich()])]);

    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 1);
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsored, 0);
    assert_eq!(state.reserve_state(&account_id(SPONSOREE)).num_sponsored, 1);
    assert_eq!(
        state.sponsor_of(&SponsorshipSubject::Account(account_id(SPONSOREE))),
        Some(&account_id(SPONSOR))
    );
    state.check_invariants().unwrap();

    // The sponsor never sources the end operation but still sees it.
    let end_participants = &output.participants[2].accounts;
    assert!(end_participants.contains(&address(SPONSOR)));
    assert!(end_participants.contains(&address(SPONSOREE)));
    assert_eq!(output.operations_for_account(&address(SPONSOR)).len(), 3);
}

#[test]
fn test_unbalanced_end_is_noop() {
    let lone_end = tx(SPONSOREE, vec![end_sponsoring(SPONSOREE)]);
    let (state, output) = run(&[ledger(10, vec![lone_end])]);

    assert!(output.effects.is_empty());
    let end = serde_json::to_value(&output.operations[0]).unwrap();
    assert!(end.get("begin_sponsor").is_none());
    assert_eq!(state.total_num_sponsoring(), 0);
    assert!(output.transactions[0].successful);
}

#[test]
fn test_nested_brackets_attribute_to_matching_sponsor() {
    const FOURTH: u8 = 4;
    let transaction = tx(
        SPONSOR,
        vec![
            begin_sponsoring(None, SPONSOREE),
            begin_sponsoring(Some(OTHER), FOURTH),
            manage_data(SPONSOREE, "a", Some(b"1")),
            manage_data(FOURTH, "b", Some(b"2")),
            end_sponsoring(FOURTH),
            end_sponsoring(SPONSOREE),
        ],
    );
    let (state, output) = run(&[ledger(10, vec![transaction])]);

    assert_eq!(
        state.sponsor_of(&SponsorshipSubject::data(account_id(SPONSOREE), b"a")),
        Some(&account_id(SPONSOR))
    );
    assert_eq!(
        state.sponsor_of(&SponsorshipSubject::data(account_id(FOURTH), b"b")),
        Some(&account_id(OTHER))
    );
    assert_eq!(output.operations[2].sponsor, Some(address(SPONSOR)));
    assert_eq!(output.operations[3].sponsor, Some(address(OTHER)));
    assert_eq!(
        effect_types(&output, &output.operations[3].id),
        vec!["data_created", "data_sponsorship_created"]
    );

    let end_inner = serde_json::to_value(&output.operations[4]).unwrap();
    assert_eq!(end_inner["begin_sponsor"], address(OTHER));
    state.check_invariants().unwrap();
}

#[test]
fn test_reopen_for_sponsored_account_is_rejected() {
    let transaction = tx(
        SPONSOR,
        vec![
            begin_sponsoring(None, SPONSOREE),
            begin_sponsoring(Some(OTHER), SPONSOREE),
            manage_data(SPONSOREE, "k", Some(b"v")),
            end_sponsoring(SPONSOREE),
            end_sponsoring(SPONSOREE),
        ],
    );
    let (state, output) = run(&[ledger(10, vec![transaction])]);

    // The first bracket stays in charge.
    assert_eq!(output.operations[2].sponsor, Some(address(SPONSOR)));
    assert_eq!(state.reserve_state(&account_id(OTHER)).num_sponsoring, 0);

    let first_end = serde_json::to_value(&output.operations[3]).unwrap();
    assert_eq!(first_end["begin_sponsor"], address(SPONSOR));
    let second_end = serde_json::to_value(&output.operations[4]).unwrap();
    assert!(second_end.get("begin_sponsor").is_none());
}

#[test]
fn test_operation_after_end_is_not_sponsored() {
    let transaction = tx(
        SPONSOR,
        vec![
            begin_sponsoring(None, SPONSOREE),
            end_sponsoring(SPONSOREE),
            manage_data(SPONSOREE, "k", Some(b"v")),
        ],
    );
    let (state, output) = run(&[ledger(10, vec![transaction])]);

    assert_eq!(output.operations[2].sponsor, None);
    assert_eq!(
        effect_types(&output, &output.operations[2].id),
        vec!["data_created"]
    );
    assert_eq!(state.total_num_sponsoring(), 0);
}

#[test]
fn test_brackets_do_not_leak_across_transactions() {
    let opens = tx(SPONSOR, vec![begin_sponsoring(None, SPONSOREE)]);
    let later = tx(SPONSOREE, vec![manage_data(SPONSOREE, "k", Some(b"v"))]);
    let (state, output) = run(&[ledger(10, vec![opens, later])]);

    assert_eq!(output.operations[1].sponsor, None);
    assert_eq!(state.total_num_sponsoring(), 0);
}

#[test]
fn test_sponsored_signer_removed_with_signer() {
    let add = tx(
        SPONSOREE,
        vec![
            begin_sponsoring(Some(SPONSOR), SPONSOREE),
            set_signer(SPONSOREE, 9, 1),
            end_sponsoring(SPONSOREE),
        ],
    );
    let remove = tx(SPONSOREE, vec![set_signer(SPONSOREE, 9, 0)]);
    let (state, output) = run(&[
        ledger(10, vec![sandwich()]),
        ledger(11, vec![add]),
        ledger(12, vec![remove]),
    ]);

    let add_op = &output.operations[4];
    assert_eq!(
        effect_types(&output, &add_op.id),
        vec!["signer_created", "signer_sponsorship_created"]
    );
    let remove_op = &output.operations[6];
    assert_eq!(
        effect_types(&output, &remove_op.id),
        vec!["signer_removed", "signer_sponsorship_removed"]
    );
    let removed = output.effects_for_operation(remove_op.id.parse().unwrap());
    assert!(matches!(
        &removed[1].details,
        EffectDetails::SignerSponsorshipRemoved { former_sponsor, .. }
            if *former_sponsor == address(SPONSOR)
    ));

    // Only the account sponsorship is left.
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 1);
    assert_eq!(state.reserve_state(&account_id(SPONSOREE)).num_sponsored, 1);
    state.check_invariants().unwrap();
}

#[test]
fn test_account_merge_removes_sponsored_entries() {
    let create = tx(
        SPONSOR,
        vec![
            begin_sponsoring(None, SPONSOREE),
            create_account(None, SPONSOREE),
            manage_data(SPONSOREE, "k", Some(b"v")),
            end_sponsoring(SPONSOREE),
        ],
    );
    let merge = tx(SPONSOREE, vec![account_merge(SPONSOREE, SPONSOR)]);
    let (state, output) = run(&[ledger(10, vec![create]), ledger(11, vec![merge])]);

    assert_eq!(output.operations[2].sponsor, Some(address(SPONSOR)));
    assert_eq!(
        effect_types(&output, &output.operations[4].id),
        vec![
            "account_debited",
            "account_credited",
            "account_removed",
            "account_sponsorship_removed",
            "data_sponsorship_removed",
        ]
    );
    assert!(state.account(&account_id(SPONSOREE)).is_none());
    assert_eq!(state.total_num_sponsoring(), 0);
    assert_eq!(state.total_num_sponsored(), 0);
    state.check_invariants().unwrap();
}

#[test]
fn test_sponsored_trustline_and_claimable_balance() {
    let mut operations = succeeded(vec![change_trust(SPONSOREE, OTHER, 1_000_000_000)]);
    operations.push((create_claimable_balance(SPONSOREE, OTHER), balance_created(9)));
    let bracket = sponsored(operations);
    let (state, output) = run(&[ledger(10, vec![sandwich()]), ledger(11, vec![bracket])]);

    assert_eq!(
        effect_types(&output, &output.operations[4].id),
        vec!["trustline_created", "trustline_sponsorship_created"]
    );
    assert_eq!(
        effect_types(&output, &output.operations[5].id),
        vec![
            "claimable_balance_created",
            "claimable_balance_claimant_created",
            "account_debited",
            "claimable_balance_sponsorship_created",
        ]
    );
    assert_eq!(output.operations[4].sponsor, Some(address(SPONSOR)));
    assert_eq!(output.operations[5].sponsor, Some(address(SPONSOR)));

    let balance = SponsorshipSubject::ClaimableBalance(format!("00000000{}", "09".repeat(32)));
    assert_eq!(state.sponsor_of(&balance), Some(&account_id(SPONSOR)));
    assert_eq!(state.entry(&balance).unwrap().owner, account_id(SPONSOREE));
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 3);
    assert_eq!(state.reserve_state(&account_id(SPONSOREE)).num_sponsored, 3);
    state.check_invariants().unwrap();
}

#[test]
fn test_claim_after_creator_merged_releases_sponsor() {
    let bracket = sponsored(vec![(
        create_claimable_balance(SPONSOREE, OTHER),
        balance_created(9),
    )]);
    let merge = tx(SPONSOREE, vec![account_merge(SPONSOREE, OTHER)]);
    let claim = tx(OTHER, vec![claim_balance(OTHER, 9)]);
    let (state, output) = run(&[
        ledger(10, vec![sandwich()]),
        ledger(11, vec![bracket]),
        ledger(12, vec![merge]),
        ledger(13, vec![claim]),
    ]);

    let claim_op = output.operations.last().unwrap();
    assert_eq!(
        effect_types(&output, &claim_op.id),
        vec!["claimable_balance_claimed", "claimable_balance_sponsorship_removed"]
    );
    let removed = output.effects.last().unwrap();
    assert_eq!(removed.account, address(SPONSOREE));

    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 0);
    // Neither the merged creator nor the sponsor keeps an empty counter row.
    assert!(state.account(&account_id(SPONSOREE)).is_none());
    assert!(state.account(&account_id(SPONSOR)).is_none());
    assert!(state.accounts_by_address().is_empty());
    state.check_invariants().unwrap();
}
