use super::*;

fn offer_42() -> SponsorshipSubject {
    SponsorshipSubject::Offer {
        seller: account_id(SPONSOREE),
        offer_id: 42,
    }
}

/// SPONSOREE places offer 42 for `amount` inside a bracket paid by SPONSOR.
fn sponsored_offer(amount: i64) -> RawTransaction {
    let created = offer_result(
        ManageOfferSuccessResultOffer::Created(offer_entry(SPONSOREE, 42, amount)),
        vec![],
    );
    sponsored(vec![(manage_sell_offer(SPONSOREE, 0, amount), created)])
}

/// OTHER sells into the book and fills `claims` without resting an offer.
fn crossing(claims: Vec<ClaimAtom>) -> RawTransaction {
    let result = offer_result(ManageOfferSuccessResultOffer::Deleted, claims);
    tx_with_results(OTHER, vec![(manage_sell_offer(OTHER, 0, 100), result)])
}

#[test]
fn test_filled_offer_releases_sponsorship() {
    let (state, output) = run(&[
        ledger(10, vec![sandwich()]),
        ledger(11, vec![sponsored_offer(100)]),
        ledger(12, vec![crossing(vec![claim(SPONSOREE, 42, 100)])]),
    ]);

    assert_eq!(output.operations[4].sponsor, Some(address(SPONSOR)));
    let cross_op = output.operations.last().unwrap();
    assert_eq!(
        effect_types(&output, &cross_op.id),
        vec!["offer_sponsorship_removed"]
    );
    let removed = output.effects.last().unwrap();
    assert_eq!(removed.account, address(SPONSOREE));
    assert_eq!(
        removed.details,
        EffectDetails::OfferSponsorshipRemoved {
            offer_id: "42".to_string(),
            former_sponsor: address(SPONSOR),
        }
    );

    assert!(!state.contains(&offer_42()));
    // Only the account reserve is still sponsored.
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 1);
    assert_eq!(state.reserve_state(&account_id(SPONSOREE)).num_sponsored, 1);
    state.check_invariants().unwrap();
}

#[test]
fn test_partial_fills_keep_offer_until_drained() {
    let (state, output) = run(&[
        ledger(10, vec![sandwich()]),
        ledger(11, vec![sponsored_offer(100)]),
        ledger(12, vec![crossing(vec![claim(SPONSOREE, 42, 40)])]),
    ]);
    let partial_op = output.operations.last().unwrap();
    assert!(effect_types(&output, &partial_op.id).is_empty());
    assert_eq!(state.amount_of(&offer_42()), Some(60));
    assert_eq!(state.sponsor_of(&offer_42()), Some(&account_id(SPONSOR)));

    let (state, output) = processor()
        .process(&state, &ledger(13, vec![crossing(vec![claim(SPONSOREE, 42, 60)])]))
        .unwrap();
    assert_eq!(
        effect_types(&output, &output.operations[0].id),
        vec!["offer_sponsorship_removed"]
    );
    assert!(!state.contains(&offer_42()));
    assert_eq!(state.reserve_state(&account_id(SPONSOR)).num_sponsoring, 1);
    state.check_invariants().unwrap();
}

#[test]
fn test_owner_update_resets_remaining_amount() {
    let updated = offer_result(
        ManageOfferSuccessResultOffer::Updated(offer_entry(SPONSOREE, 42, 250)),
        vec![],
    );
    let update = tx_with_results(
        SPONSOREE,
        vec![(manage_sell_offer(SPONSOREE, 42, 250), updated)],
    );
    let (state, _) = run(&[
        ledger(10, vec![sandwich()]),
        ledger(11, vec![sponsored_offer(100)]),
        ledger(12, vec![update]),
        ledger(13, vec![crossing(vec![claim(SPONSOREE, 42, 100)])]),
    ]);

    assert_eq!(state.amount_of(&offer_42()), Some(150));
    assert_eq!(state.sponsor_of(&offer_42()), Some(&account_id(SPONSOR)));
    state.check_invariants().unwrap();
}
