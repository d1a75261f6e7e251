// THRESHOLD SECRECY INTEGRATION TESTS
// Exercises the public API of tessera-crypto end to end:
// - exact recovery from any threshold-size subset
// - no useful signal below the threshold
// - rotation followed by refresh keeps the rotated secret recoverable

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tessera_crypto::{
    create_shares, reconstruct_secret, refresh_shares, CryptoError, KeyRotator, PrimeField,
    SecretRange,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_every_threshold_subset_recovers_secret() {
    init_logger();
    let field = PrimeField::legacy();
    let mut rng = StdRng::seed_from_u64(2024);
    let shares = create_shares(42, 5, 3, &field, &mut rng).unwrap();

    for a in 0..5 {
        for b in (a + 1)..5 {
            for c in (b + 1)..5 {
                let subset = [shares[a], shares[b], shares[c]];
                assert_eq!(reconstruct_secret(&subset, &field).unwrap().value(), 42);
            }
        }
    }
}

#[test]
fn test_below_threshold_interpolation_is_chance_level() {
    init_logger();
    let field = PrimeField::legacy();
    let mut rng = StdRng::seed_from_u64(31337);
    let trials = 2000;
    let mut hits = 0;
    let mut guesses = HashSet::new();

    for _ in 0..trials {
        let shares = create_shares(42, 5, 3, &field, &mut rng).unwrap();
        let pair: Vec<_> = shares
            .choose_multiple(&mut rng, 2)
            .map(|s| (field.reduce(s.index as u64), s.value))
            .collect();

        let guess = field.lagrange_at_zero(&pair).unwrap();
        if guess.value() == 42 {
            hits += 1;
        }
        guesses.insert(guess.value());
    }

    // Chance agreement is trials / p ≈ 1.
    assert!(hits < 15, "below-threshold guesses matched {} times", hits);
    assert!(guesses.len() > 1000, "guesses cover only {} residues", guesses.len());
}

#[test]
fn test_below_threshold_reconstruction_is_refused() {
    let field = PrimeField::legacy();
    let mut rng = StdRng::seed_from_u64(1);
    let shares = create_shares(42, 5, 3, &field, &mut rng).unwrap();
    assert!(matches!(
        reconstruct_secret(&shares[..2], &field),
        Err(CryptoError::InsufficientShares { got: 2, need: 3 })
    ));
}

#[test]
fn test_rotate_then_refresh() {
    init_logger();
    let field = PrimeField::new(1_000_000_007).unwrap();
    let rotator = KeyRotator::new(field, SecretRange { start: 10, end: 1_000_000 }).unwrap();
    let mut rng = StdRng::seed_from_u64(99);

    let key = rotator.rotate(7, 4, &mut rng).unwrap();
    assert!((10..=1_000_000).contains(&key.secret.value()));

    let refreshed = refresh_shares(&key.shares, &field, &mut rng).unwrap();
    let mut subset = refreshed.clone();
    subset.shuffle(&mut rng);
    subset.truncate(4);
    assert_eq!(reconstruct_secret(&subset, &field).unwrap(), key.secret);
}
