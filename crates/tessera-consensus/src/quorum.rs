// Byzantine quorum thresholds
//
// SAFETY INVARIANTS:
// 1. minimum_honest(n) == ceil(2n / 3), computed in exact integer arithmetic
// 2. has_quorum is the ONLY place the vote fraction is applied; every
//    acceptance decision in this crate goes through it
// 3. A set of n validators tolerates f faults iff 3f < n

use crate::errors::{ConsensusError, ConsensusResult};

/// Minimum number of non-faulty validators a decision needs, `ceil(2n / 3)`.
///
/// Computed as `n - floor(n / 3)`, which equals `ceil(2n / 3)` and cannot
/// overflow for any `n`.
pub fn minimum_honest(total_validators: usize) -> usize {
    total_validators - total_validators / 3
}

/// Whether `valid` agreeing votes out of `total_validators` form a quorum.
pub fn has_quorum(valid: usize, total_validators: usize) -> bool {
    valid >= minimum_honest(total_validators)
}

/// Largest number of Byzantine validators `total_validators` can absorb
/// (the largest f with 3f < n).
pub fn max_tolerated_faults(total_validators: usize) -> usize {
    total_validators.saturating_sub(1) / 3
}

/// Whether a set of `total_validators` stays safe with `byzantine` faulty members.
pub fn tolerates(total_validators: usize, byzantine: usize) -> bool {
    byzantine <= max_tolerated_faults(total_validators)
}

/// Check that the vote rule flips exactly at `minimum_honest(n)`.
///
/// Guards against the vote threshold and the quorum size drifting apart,
/// which would silently weaken the safety assumption.
pub fn check_consistency(total_validators: usize) -> ConsensusResult<()> {
    let required = minimum_honest(total_validators);

    let vote_threshold = (0..=total_validators)
        .find(|&valid| has_quorum(valid, total_validators))
        .unwrap_or(usize::MAX);

    if vote_threshold != required {
        return Err(ConsensusError::ConsistencyViolation {
            validators: total_validators,
            vote_threshold,
            minimum_honest: required,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_minimum_honest_table() {
        let table = [
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 2),
            (4, 3),
            (5, 4),
            (6, 4),
            (7, 5),
            (99, 66),
            (100, 67),
        ];
        for (n, expected) in table {
            assert_eq!(minimum_honest(n), expected, "minimum_honest({})", n);
        }
    }

    #[test]
    fn test_minimum_honest_never_overflows() {
        assert_eq!(minimum_honest(usize::MAX), usize::MAX - usize::MAX / 3);
    }

    #[test]
    fn test_has_quorum_boundary() {
        assert!(has_quorum(3, 4));
        assert!(!has_quorum(2, 4));
        assert!(has_quorum(2, 3));
        assert!(!has_quorum(1, 3));
    }

    #[test]
    fn test_fault_tolerance() {
        assert_eq!(max_tolerated_faults(0), 0);
        assert_eq!(max_tolerated_faults(3), 0);
        assert_eq!(max_tolerated_faults(4), 1);
        assert_eq!(max_tolerated_faults(7), 2);
        assert!(tolerates(4, 1));
        assert!(!tolerates(3, 1));
        assert!(!tolerates(6, 2));
    }

    #[test]
    fn test_consistency_for_many_sizes() {
        for n in 0..=1000 {
            check_consistency(n).unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_matches_integer_ceiling(n in 0usize..1_000_000) {
            prop_assert_eq!(minimum_honest(n), (2 * n).div_ceil(3));
        }

        #[test]
        fn prop_quorum_and_faults_partition(n in 1usize..100_000) {
            // Honest quorum plus tolerated faults never exceeds the set.
            prop_assert!(minimum_honest(n) + max_tolerated_faults(n) <= n);
        }
    }
}
