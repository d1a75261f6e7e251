// Validator set lifecycle: rounds, block votes, membership
//
// SAFETY INVARIANTS:
// 1. The roster is owned exclusively by ValidatorSet and only mutated
//    through &mut self between rounds
// 2. Per-validator actions are evaluated in parallel but the tally is only
//    computed once every outcome of the round has been collected
// 3. Block acceptance is decided by quorum::has_quorum and nothing else
// 4. Membership is rebuilt from a snapshot; the sequence being walked is
//    never mutated
// 5. Validator ids are never reused

use crate::errors::{ConsensusError, ConsensusResult};
use crate::quorum::{has_quorum, minimum_honest};
use crate::validator::{
    ActionRecord, StakePolicy, Validator, ValidatorAction, ValidatorId, VoteOutcome,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Outcome of a block vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockDecision {
    Accepted,
    Rejected,
}

impl fmt::Display for BlockDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockDecision::Accepted => write!(f, "ACCEPTED"),
            BlockDecision::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Per-round vote counts. Not persisted beyond the round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub valid: usize,
    pub invalid: usize,
}

impl VoteTally {
    pub fn from_outcomes<I: IntoIterator<Item = VoteOutcome>>(outcomes: I) -> Self {
        outcomes
            .into_iter()
            .fold(VoteTally::default(), |mut tally, outcome| {
                match outcome {
                    VoteOutcome::Valid => tally.valid += 1,
                    VoteOutcome::Invalid => tally.invalid += 1,
                }
                tally
            })
    }

    pub fn total(&self) -> usize {
        self.valid + self.invalid
    }

    pub fn decision(&self) -> BlockDecision {
        if has_quorum(self.valid, self.total()) {
            BlockDecision::Accepted
        } else {
            BlockDecision::Rejected
        }
    }
}

/// Everything that happened to the set in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundVote {
    pub round: u64,
    pub records: Vec<ActionRecord>,
    pub tally: VoteTally,
    pub minimum_honest: usize,
    pub decision: BlockDecision,
}

/// Result of one membership pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipUpdate {
    /// The rebuilt roster, in input order with new members appended
    pub roster: Vec<Validator>,

    /// Validators evicted for low stake
    pub removed: Vec<Validator>,

    /// Validators created by growth
    pub added: Vec<Validator>,

    /// Next id to hand out
    pub next_id: ValidatorId,
}

/// Evaluate every validator's action for `round` without mutating anything.
///
/// Actions are pure, so evaluation fans out across the rayon pool; the
/// returned vector is in roster order.
pub fn evaluate_round(validators: &[Validator], round: u64) -> Vec<ValidatorAction> {
    validators.par_iter().map(|v| v.decide(round)).collect()
}

/// Decide whether the block proposed in `round` is accepted.
///
/// Tallies each validator's typed outcome and accepts iff the valid count
/// reaches `minimum_honest(n)`.
///
/// # Errors
/// `EmptyValidatorSet` when there is nobody to vote.
pub fn vote_on_block(validators: &[Validator], round: u64) -> ConsensusResult<BlockDecision> {
    if validators.is_empty() {
        return Err(ConsensusError::EmptyValidatorSet);
    }
    let actions = evaluate_round(validators, round);
    Ok(VoteTally::from_outcomes(actions.into_iter().map(ValidatorAction::outcome)).decision())
}

/// Evict low-stake validators and grow the set for high-stake ones.
///
/// Walks `validators` in order. A validator with stake below the eviction
/// bound is dropped; otherwise it is kept and, if its stake exceeds the
/// growth bound, one new honest validator is appended. `next_id` is only a
/// floor: the counter starts above every id in the snapshot and above its
/// size, so new ids never collide with a surviving or evicted member even
/// when the caller's counter is stale.
pub fn manage_membership(
    validators: &[Validator],
    policy: &StakePolicy,
    next_id: ValidatorId,
) -> MembershipUpdate {
    let mut roster = Vec::with_capacity(validators.len());
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let highest = validators.iter().map(|v| v.id).max().unwrap_or(0);
    let mut next_id = next_id
        .max(highest.saturating_add(1))
        .max(validators.len() as ValidatorId + 1);

    for validator in validators {
        if validator.is_evictable(policy) {
            warn!(
                "Removing validator {} due to low stake ({})",
                validator.id, validator.stake
            );
            removed.push(validator.clone());
            continue;
        }

        roster.push(validator.clone());

        if validator.sponsors_growth(policy) {
            let current_size = (roster.len() + added.len()) as ValidatorId;
            let id = next_id.max(current_size + 1);
            next_id = id + 1;

            let newcomer = Validator::honest(id, policy);
            info!(
                "Adding validator {} sponsored by validator {} (stake {})",
                id, validator.id, validator.stake
            );
            added.push(newcomer);
        }
    }

    roster.extend(added.iter().cloned());

    MembershipUpdate {
        roster,
        removed,
        added,
        next_id,
    }
}

/// Change summary returned by [`ValidatorSet::manage_membership`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChanges {
    pub removed: Vec<ValidatorId>,
    pub added: Vec<ValidatorId>,
}

/// The authoritative, exclusively owned validator roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    policy: StakePolicy,
    next_id: ValidatorId,
}

impl ValidatorSet {
    /// Genesis set: ids `1..=total`, the first `byzantine` of them Byzantine.
    ///
    /// # Errors
    /// - `InvalidValidatorCount` if `total == 0` or `byzantine > total`
    /// - `InvalidPolicy` if the policy is incoherent
    pub fn new(total: usize, byzantine: usize, policy: StakePolicy) -> ConsensusResult<Self> {
        if total == 0 || byzantine > total {
            return Err(ConsensusError::InvalidValidatorCount { total, byzantine });
        }
        policy.validate()?;

        let validators = (0..total)
            .map(|i| {
                let id = i as ValidatorId + 1;
                if i < byzantine {
                    Validator::byzantine(id, &policy)
                } else {
                    Validator::honest(id, &policy)
                }
            })
            .collect();

        Ok(ValidatorSet {
            validators,
            policy,
            next_id: total as ValidatorId + 1,
        })
    }

    /// Adopt an existing roster.
    ///
    /// # Errors
    /// `DuplicateValidatorId` if two records share an id.
    pub fn from_validators(validators: Vec<Validator>, policy: StakePolicy) -> ConsensusResult<Self> {
        policy.validate()?;

        let mut seen = BTreeSet::new();
        for v in &validators {
            if !seen.insert(v.id) {
                return Err(ConsensusError::DuplicateValidatorId(v.id));
            }
        }

        let next_id = seen
            .last()
            .map(|max| max + 1)
            .unwrap_or(1)
            .max(validators.len() as ValidatorId + 1);

        Ok(ValidatorSet {
            validators,
            policy,
            next_id,
        })
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn get(&self, id: ValidatorId) -> Option<&Validator> {
        self.validators.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn policy(&self) -> &StakePolicy {
        &self.policy
    }

    pub fn byzantine_count(&self) -> usize {
        self.validators.iter().filter(|v| v.is_byzantine).count()
    }

    /// Quorum size for the current roster.
    pub fn minimum_honest(&self) -> usize {
        minimum_honest(self.validators.len())
    }

    /// Evaluate the block vote for `round` without applying any stake change.
    pub fn vote_on_block(&self, round: u64) -> ConsensusResult<BlockDecision> {
        vote_on_block(&self.validators, round)
    }

    /// Run one round: every validator acts once, stakes move, the block is voted.
    ///
    /// Stake moves exactly once per validator per round; the action that
    /// sets the vote is the same one that sets the stake change.
    ///
    /// Stake changes are staged on a copy of the roster and committed only if
    /// every one of them succeeds.
    pub fn play_round(&mut self, round: u64) -> ConsensusResult<RoundVote> {
        if self.validators.is_empty() {
            return Err(ConsensusError::EmptyValidatorSet);
        }

        let actions = evaluate_round(&self.validators, round);

        let mut staged = self.validators.clone();
        let records = staged
            .iter_mut()
            .zip(actions)
            .map(|(validator, action)| validator.apply(action, &self.policy))
            .collect::<ConsensusResult<Vec<_>>>()?;

        let tally = VoteTally::from_outcomes(records.iter().map(|r| r.outcome));
        let decision = tally.decision();
        self.validators = staged;

        debug!(
            "Round {}: {} valid / {} invalid, quorum {} -> {}",
            round,
            tally.valid,
            tally.invalid,
            minimum_honest(tally.total()),
            decision
        );

        Ok(RoundVote {
            round,
            records,
            tally,
            minimum_honest: minimum_honest(tally.total()),
            decision,
        })
    }

    /// Apply one membership pass to the roster.
    pub fn manage_membership(&mut self) -> MembershipChanges {
        let update = manage_membership(&self.validators, &self.policy, self.next_id);

        self.validators = update.roster;
        self.next_id = update.next_id;

        MembershipChanges {
            removed: update.removed.iter().map(|v| v.id).collect(),
            added: update.added.iter().map(|v| v.id).collect(),
        }
    }
}
