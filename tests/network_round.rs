// NETWORK INTEGRATION TESTS
// Exercises the crypto and consensus crates together: validators hold one
// share each, the share threshold is the quorum size, and the set evolves
// across rounds while keys rotate.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tessera::consensus::{
    max_tolerated_faults, minimum_honest, vote_on_block, BlockDecision, RoundVote, StakePolicy,
    Validator, ValidatorSet,
};
use tessera::crypto::{
    create_shares, reconstruct_secret, refresh_shares, CryptoError, KeyRotator, PrimeField, Share,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One share per validator, threshold equal to the quorum size.
fn deal(set: &ValidatorSet, secret: u64, field: &PrimeField, rng: &mut StdRng) -> Vec<Share> {
    let n = set.len() as u32;
    create_shares(secret, n, minimum_honest(set.len()) as u32, field, rng).unwrap()
}

#[test]
fn test_legacy_example_end_to_end() {
    init_logger();
    let field = PrimeField::legacy();
    let mut rng = StdRng::seed_from_u64(2087);
    let shares = create_shares(42, 5, 3, &field, &mut rng).unwrap();

    for subset in [[1u32, 3, 5], [2, 4, 5]] {
        let picked: Vec<Share> = shares
            .iter()
            .filter(|s| subset.contains(&s.index))
            .copied()
            .collect();
        assert_eq!(reconstruct_secret(&picked, &field).unwrap().value(), 42);
    }

    let policy = StakePolicy::default();
    let roster = vec![
        Validator::byzantine(1, &policy),
        Validator::honest(2, &policy),
        Validator::honest(3, &policy),
        Validator::honest(4, &policy),
    ];
    assert_eq!(vote_on_block(&roster, 1).unwrap(), BlockDecision::Accepted);
}

#[test]
fn test_honest_quorum_holds_the_key_and_faulty_minority_does_not() {
    init_logger();
    let field = PrimeField::default();
    let mut rng = StdRng::seed_from_u64(11);

    for total in 1..=13usize {
        let byzantine = max_tolerated_faults(total);
        let set = ValidatorSet::new(total, byzantine, StakePolicy::default()).unwrap();
        let shares = deal(&set, 424_242, &field, &mut rng);

        // Shares are handed out in roster order, so share i belongs to validator i.
        let honest: Vec<Share> = set
            .validators()
            .iter()
            .zip(&shares)
            .filter(|(v, _)| !v.is_byzantine)
            .map(|(_, s)| *s)
            .collect();
        let faulty: Vec<Share> = set
            .validators()
            .iter()
            .zip(&shares)
            .filter(|(v, _)| v.is_byzantine)
            .map(|(_, s)| *s)
            .collect();

        assert_eq!(
            reconstruct_secret(&honest, &field).unwrap().value(),
            424_242,
            "honest members of {} must reconstruct",
            total
        );
        if !faulty.is_empty() {
            assert!(matches!(
                reconstruct_secret(&faulty, &field),
                Err(CryptoError::InsufficientShares { .. })
            ));
        }
        assert_eq!(set.vote_on_block(1).unwrap(), BlockDecision::Accepted);
    }
}

#[test]
fn test_rounds_with_rotation_and_refresh() {
    init_logger();
    let field = PrimeField::default();
    let rotator = KeyRotator::with_default_range(field);
    let mut rng = StdRng::seed_from_u64(5);
    let mut set = ValidatorSet::new(4, 1, StakePolicy::default()).unwrap();

    let mut secret = 42u64;
    for round in 1..=6 {
        let vote = set.play_round(round).unwrap();
        assert_eq!(vote.decision, BlockDecision::Accepted);

        let shares = deal(&set, secret, &field, &mut rng);
        let refreshed = refresh_shares(&shares, &field, &mut rng).unwrap();
        let quorum: Vec<Share> = refreshed
            .choose_multiple(&mut rng, minimum_honest(set.len()))
            .copied()
            .collect();
        assert_eq!(reconstruct_secret(&quorum, &field).unwrap().value(), secret);

        let key = rotator
            .rotate(set.len() as u32, minimum_honest(set.len()) as u32, &mut rng)
            .unwrap();
        secret = key.secret.value();
        set.manage_membership();
    }

    // The byzantine member was evicted after round 2 and growth kept ids unique.
    assert_eq!(set.byzantine_count(), 0);
    let mut ids: Vec<_> = set.validators().iter().map(|v| v.id).collect();
    let before = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), before);
    assert!(set.len() > 3);
}

#[test]
fn test_round_artifacts_survive_json() {
    let field = PrimeField::legacy();
    let mut rng = StdRng::seed_from_u64(17);
    let shares = create_shares(42, 5, 3, &field, &mut rng).unwrap();

    let json = serde_json::to_string(&shares).unwrap();
    let decoded: Vec<Share> = serde_json::from_str(&json).unwrap();
    assert_eq!(reconstruct_secret(&decoded[2..], &field).unwrap().value(), 42);

    let mut set = ValidatorSet::new(4, 1, StakePolicy::default()).unwrap();
    let vote = set.play_round(2).unwrap();
    let json = serde_json::to_value(&vote).unwrap();
    assert_eq!(json["tally"]["valid"], 3);
    assert_eq!(json["decision"], "Accepted");
    let decoded: RoundVote = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, vote);
}

proptest! {
    #[test]
    fn prop_quorum_share_threshold_matches_vote(total in 1usize..40, byzantine_seed in any::<usize>()) {
        let byzantine = byzantine_seed % (total + 1);
        let set = ValidatorSet::new(total, byzantine, StakePolicy::default()).unwrap();

        // A block passes exactly when the honest members alone could
        // reconstruct a key dealt with the quorum-sized threshold.
        let honest_can_reconstruct = total - byzantine >= minimum_honest(total);
        let accepted = set.vote_on_block(1).unwrap() == BlockDecision::Accepted;
        prop_assert_eq!(accepted, honest_can_reconstruct);
    }
}
