// ROUND LIFECYCLE INTEGRATION TESTS
// Drives a ValidatorSet through several rounds the way the network does:
// play the round, vote, then manage membership. Verifies that Byzantine
// members are penalized out and that honest growth keeps ids unique.

use std::collections::HashSet;
use tessera_consensus::{
    check_consistency, minimum_honest, vote_on_block, BlockDecision, StakePolicy, Validator,
    ValidatorSet,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_byzantine_validators_are_evicted() {
    init_logger();
    let mut set = ValidatorSet::new(4, 1, StakePolicy::default()).unwrap();

    // Round 1 (odd): byzantine loses 30 -> 70. Round 2 (even): loses 50 -> 20.
    let first = set.play_round(1).unwrap();
    assert_eq!(first.decision, BlockDecision::Accepted);
    assert!(set.manage_membership().removed.is_empty());

    set.play_round(2).unwrap();
    let changes = set.manage_membership();
    assert_eq!(changes.removed, vec![1]);
    assert_eq!(set.byzantine_count(), 0);
    assert_eq!(set.len(), 3);
}

#[test]
fn test_honest_growth_over_many_rounds() {
    init_logger();
    let mut set = ValidatorSet::new(3, 0, StakePolicy::default()).unwrap();

    for round in 1..=8 {
        let vote = set.play_round(round).unwrap();
        assert_eq!(vote.decision, BlockDecision::Accepted);
        set.manage_membership();
    }

    // Stake 100 + 6 * 10 = 160 > 150 after round 6: every genesis member sponsors.
    assert!(set.len() > 3);
    let ids: HashSet<_> = set.validators().iter().map(|v| v.id).collect();
    assert_eq!(ids.len(), set.len(), "validator ids must be unique");
}

#[test]
fn test_majority_byzantine_rejects_until_evicted() {
    init_logger();
    let mut set = ValidatorSet::new(3, 2, StakePolicy::default()).unwrap();

    assert_eq!(set.play_round(1).unwrap().decision, BlockDecision::Rejected);
    set.manage_membership();
    assert_eq!(set.play_round(2).unwrap().decision, BlockDecision::Rejected);
    set.manage_membership();

    // Both byzantine members fell to 20 and were removed.
    assert_eq!(set.len(), 1);
    assert_eq!(set.play_round(3).unwrap().decision, BlockDecision::Accepted);
}

#[test]
fn test_vote_matches_minimum_honest_for_every_split() {
    let policy = StakePolicy::default();
    for total in 1..=30usize {
        check_consistency(total).unwrap();
        for byzantine in 0..=total {
            let roster: Vec<Validator> = (0..total)
                .map(|i| {
                    if i < byzantine {
                        Validator::byzantine(i as u64 + 1, &policy)
                    } else {
                        Validator::honest(i as u64 + 1, &policy)
                    }
                })
                .collect();
            let expected = if total - byzantine >= minimum_honest(total) {
                BlockDecision::Accepted
            } else {
                BlockDecision::Rejected
            };
            assert_eq!(vote_on_block(&roster, 1).unwrap(), expected);
        }
    }
}

#[test]
fn test_round_vote_serializes() {
    let mut set = ValidatorSet::new(2, 1, StakePolicy::default()).unwrap();
    let vote = set.play_round(1).unwrap();
    let json = serde_json::to_value(&vote).unwrap();
    assert_eq!(json["decision"], "Rejected");
    assert_eq!(json["records"][0]["action"], "WithheldVote");
}
