// Validator records and per-round behavior
//
// SAFETY INVARIANTS:
// 1. Deciding an action is a pure function of (validator, round)
// 2. Actions carry a typed vote outcome; nothing is inferred from text
// 3. Stake changes are applied with checked arithmetic, never wrapping
// 4. Every economic constant lives in StakePolicy

use crate::errors::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ValidatorId = u64;

/// How a validator's action counts towards the block vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOutcome {
    Valid,
    Invalid,
}

/// What a validator did in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorAction {
    /// Followed the protocol; earns the participation reward
    HonestParticipation,

    /// Byzantine, even rounds: submitted conflicting transactions
    ConflictingTransactions,

    /// Byzantine, odd rounds: withheld its vote
    WithheldVote,
}

impl ValidatorAction {
    pub fn outcome(self) -> VoteOutcome {
        match self {
            ValidatorAction::HonestParticipation => VoteOutcome::Valid,
            ValidatorAction::ConflictingTransactions | ValidatorAction::WithheldVote => {
                VoteOutcome::Invalid
            }
        }
    }

    /// Signed stake change this action earns under `policy`.
    pub fn stake_delta(self, policy: &StakePolicy) -> i64 {
        match self {
            ValidatorAction::HonestParticipation => policy.honest_reward,
            ValidatorAction::ConflictingTransactions => policy.conflicting_tx_penalty.saturating_neg(),
            ValidatorAction::WithheldVote => policy.withheld_vote_penalty.saturating_neg(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorAction::HonestParticipation => "HONEST_PARTICIPATION",
            ValidatorAction::ConflictingTransactions => "CONFLICTING_TRANSACTIONS",
            ValidatorAction::WithheldVote => "WITHHELD_VOTE",
        }
    }
}

impl fmt::Display for ValidatorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Economic parameters of the simulated network.
///
/// Defaults reproduce the network's launch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakePolicy {
    /// Stake assigned to every new validator
    pub initial_stake: i64,

    /// Reputation assigned to every new validator
    pub initial_reputation: i64,

    /// Reward for an honest round
    pub honest_reward: i64,

    /// Penalty for submitting conflicting transactions
    pub conflicting_tx_penalty: i64,

    /// Penalty for withholding a vote
    pub withheld_vote_penalty: i64,

    /// Validators with stake strictly below this are evicted
    pub eviction_threshold: i64,

    /// Validators with stake strictly above this sponsor a new member
    pub growth_threshold: i64,
}

impl Default for StakePolicy {
    fn default() -> Self {
        StakePolicy {
            initial_stake: 100,
            initial_reputation: 100,
            honest_reward: 10,
            conflicting_tx_penalty: 50,
            withheld_vote_penalty: 30,
            eviction_threshold: 50,
            growth_threshold: 150,
        }
    }
}

impl StakePolicy {
    /// Reject policies that would make membership management incoherent.
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.honest_reward < 0 || self.conflicting_tx_penalty < 0 || self.withheld_vote_penalty < 0 {
            return Err(ConsensusError::InvalidPolicy(
                "rewards and penalties must be non-negative".to_string(),
            ));
        }
        if self.eviction_threshold >= self.growth_threshold {
            return Err(ConsensusError::InvalidPolicy(format!(
                "eviction threshold {} must be below growth threshold {}",
                self.eviction_threshold, self.growth_threshold
            )));
        }
        if self.initial_stake < self.eviction_threshold {
            return Err(ConsensusError::InvalidPolicy(format!(
                "initial stake {} is already below the eviction threshold {}",
                self.initial_stake, self.eviction_threshold
            )));
        }
        Ok(())
    }
}

/// A member of the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub stake: i64,
    pub is_byzantine: bool,
    pub reputation: i64,
}

/// Result of applying one action to one validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub validator_id: ValidatorId,
    pub action: ValidatorAction,
    pub outcome: VoteOutcome,
    pub stake_before: i64,
    pub stake_after: i64,
}

impl Validator {
    pub fn honest(id: ValidatorId, policy: &StakePolicy) -> Self {
        Validator {
            id,
            stake: policy.initial_stake,
            is_byzantine: false,
            reputation: policy.initial_reputation,
        }
    }

    pub fn byzantine(id: ValidatorId, policy: &StakePolicy) -> Self {
        Validator {
            is_byzantine: true,
            ..Validator::honest(id, policy)
        }
    }

    /// The action this validator takes in `round`.
    ///
    /// Byzantine validators alternate by round parity; honest ones always
    /// participate.
    pub fn decide(&self, round: u64) -> ValidatorAction {
        if !self.is_byzantine {
            ValidatorAction::HonestParticipation
        } else if round % 2 == 0 {
            ValidatorAction::ConflictingTransactions
        } else {
            ValidatorAction::WithheldVote
        }
    }

    /// Apply `action`'s stake delta.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the stake cannot represent the result; the
    /// validator is left unchanged in that case.
    pub fn apply(&mut self, action: ValidatorAction, policy: &StakePolicy) -> ConsensusResult<ActionRecord> {
        let delta = action.stake_delta(policy);
        let stake_after = self
            .stake
            .checked_add(delta)
            .ok_or(ConsensusError::ArithmeticOverflow {
                validator_id: self.id,
                delta,
            })?;

        let record = ActionRecord {
            validator_id: self.id,
            action,
            outcome: action.outcome(),
            stake_before: self.stake,
            stake_after,
        };
        self.stake = stake_after;
        Ok(record)
    }

    pub fn is_evictable(&self, policy: &StakePolicy) -> bool {
        self.stake < policy.eviction_threshold
    }

    pub fn sponsors_growth(&self, policy: &StakePolicy) -> bool {
        self.stake > policy.growth_threshold
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validator {} (stake={}, reputation={}, byzantine={})",
            self.id, self.stake, self.reputation, self.is_byzantine
        )
    }
}
