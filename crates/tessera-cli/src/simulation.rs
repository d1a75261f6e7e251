// Round driver
//
// Sequences one round at a time, exactly as the network does:
// 1. every validator acts and the proposed block is voted on
// 2. the active secret is shared and a random threshold subset is
//    reconstructed for audit
// 3. the key is rotated; the rotated secret becomes the active one
// 4. membership is managed (evictions and growth)
//
// Nothing here is concurrent across rounds. Each round's report is handed
// to the caller before the next round starts.

use crate::settings::SimulationConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_consensus::{
    max_tolerated_faults, BlockDecision, ConsensusError, MembershipChanges, RoundVote, Validator,
    ValidatorSet,
};
use tessera_crypto::{
    CryptoError, FieldElement, KeyRotator, PrimeField, SecretRange, SecretSharing, Share,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameters: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("round {round}: reconstructed {reconstructed} but the active secret is {expected}")]
    ReconstructionMismatch {
        round: u64,
        expected: FieldElement,
        reconstructed: FieldElement,
    },
}

/// Parameter combinations that are legal but weaken the security model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    /// Byzantine validators alone could pool enough shares to reconstruct
    ShareCollusion { byzantine: usize, threshold: u32 },

    /// More Byzantine validators than the quorum can absorb
    FaultToleranceExceeded { byzantine: usize, tolerated: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ShareCollusion { byzantine, threshold } => write!(
                f,
                "{} byzantine validators can reach the share threshold of {}",
                byzantine, threshold
            ),
            Advisory::FaultToleranceExceeded { byzantine, tolerated } => write!(
                f,
                "{} byzantine validators exceed the {} the quorum tolerates",
                byzantine, tolerated
            ),
        }
    }
}

/// Everything observable about one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u64,
    pub vote: RoundVote,
    pub shares: Vec<Share>,
    pub audited_indices: Vec<u32>,
    pub reconstructed_secret: FieldElement,
    pub rotated_secret: FieldElement,
    pub rotated_shares: Vec<Share>,
    pub membership: MembershipChanges,
    pub roster_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub rounds_played: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Round at which the validator set ran empty, if it did
    pub halted_at: Option<u64>,
    pub final_roster: Vec<Validator>,
}

pub struct Simulation {
    config: SimulationConfig,
    sharing: SecretSharing,
    rotator: KeyRotator,
    validators: ValidatorSet,
    active_secret: FieldElement,
    rng: StdRng,
}

impl Simulation {
    /// Validate `config` and set up genesis state.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        validate(&config)?;

        let sharing = SecretSharing::new(
            config.total_shares,
            config.threshold,
            PrimeField::new(config.modulus)?,
        )?;
        let field = *sharing.field();
        let rotator = match config.secret_range {
            Some(range) => KeyRotator::new(field, range)?,
            None => KeyRotator::with_default_range(field),
        };
        let active_secret = field.element(config.secret)?;
        let validators = ValidatorSet::new(
            config.total_validators,
            config.byzantine_count,
            config.stake_policy,
        )?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Simulation {
            config,
            sharing,
            rotator,
            validators,
            active_secret,
            rng,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn active_secret(&self) -> FieldElement {
        self.active_secret
    }

    /// Range rotated secrets are drawn from.
    pub fn rotation_range(&self) -> SecretRange {
        self.rotator.range()
    }

    /// Legal-but-risky parameter combinations for the genesis set.
    pub fn advisories(&self) -> Vec<Advisory> {
        let byzantine = self.config.byzantine_count;
        let mut advisories = Vec::new();

        if byzantine >= self.config.threshold as usize {
            advisories.push(Advisory::ShareCollusion {
                byzantine,
                threshold: self.config.threshold,
            });
        }

        let tolerated = max_tolerated_faults(self.config.total_validators);
        if byzantine > tolerated {
            advisories.push(Advisory::FaultToleranceExceeded {
                byzantine,
                tolerated,
            });
        }

        advisories
    }

    /// Play a single round.
    pub fn run_round(&mut self, round: u64) -> Result<RoundReport, SimulationError> {
        let vote = self.validators.play_round(round)?;
        info!(
            round,
            valid = vote.tally.valid,
            invalid = vote.tally.invalid,
            minimum_honest = vote.minimum_honest,
            decision = %vote.decision,
            "block vote"
        );

        let shares = self.sharing.split(self.active_secret.value(), &mut self.rng)?;
        let audit: Vec<Share> = shares
            .choose_multiple(&mut self.rng, self.sharing.threshold() as usize)
            .copied()
            .collect();
        let reconstructed_secret = self.sharing.combine(&audit)?;
        if reconstructed_secret != self.active_secret {
            return Err(SimulationError::ReconstructionMismatch {
                round,
                expected: self.active_secret,
                reconstructed: reconstructed_secret,
            });
        }
        debug!(round, shares = shares.len(), "secret shared and reconstructed");

        let rotated = self
            .rotator
            .rotate(self.sharing.total_shares(), self.sharing.threshold(), &mut self.rng)?;
        self.active_secret = rotated.secret;
        debug!(round, "key rotated");

        let membership = self.validators.manage_membership();
        if !membership.removed.is_empty() || !membership.added.is_empty() {
            info!(
                round,
                removed = ?membership.removed,
                added = ?membership.added,
                roster = self.validators.len(),
                "membership changed"
            );
        }

        Ok(RoundReport {
            round,
            vote,
            shares,
            audited_indices: audit.iter().map(|s| s.index).collect(),
            reconstructed_secret,
            rotated_secret: rotated.secret,
            rotated_shares: rotated.shares,
            membership,
            roster_size: self.validators.len(),
        })
    }

    /// Play every configured round, handing each report to `on_round`.
    ///
    /// Stops early, without error, once the validator set is empty.
    pub fn run_with<F>(&mut self, mut on_round: F) -> Result<SimulationSummary, SimulationError>
    where
        F: FnMut(&RoundReport),
    {
        let mut summary = SimulationSummary {
            rounds_played: 0,
            accepted: 0,
            rejected: 0,
            halted_at: None,
            final_roster: Vec::new(),
        };

        for round in 1..=self.config.rounds {
            if self.validators.is_empty() {
                warn!(round, "validator set is empty; halting");
                summary.halted_at = Some(round);
                break;
            }

            let report = self.run_round(round)?;
            summary.rounds_played += 1;
            match report.vote.decision {
                BlockDecision::Accepted => summary.accepted += 1,
                BlockDecision::Rejected => summary.rejected += 1,
            }
            on_round(&report);
        }

        summary.final_roster = self.validators.validators().to_vec();
        Ok(summary)
    }

    pub fn run(&mut self) -> Result<SimulationSummary, SimulationError> {
        self.run_with(|_| {})
    }
}

/// Driver-side input checks. The core crates re-check what they own.
pub fn validate(config: &SimulationConfig) -> Result<(), SimulationError> {
    let invalid = |msg: String| Err(SimulationError::InvalidConfig(msg));

    if config.total_validators == 0 {
        return invalid("total_validators must be positive".to_string());
    }
    if config.byzantine_count > config.total_validators {
        return invalid(format!(
            "byzantine_count {} exceeds total_validators {}",
            config.byzantine_count, config.total_validators
        ));
    }
    if config.total_shares == 0 || config.threshold == 0 {
        return invalid("total_shares and threshold must be positive".to_string());
    }
    if config.threshold > config.total_shares {
        return invalid(format!(
            "threshold {} exceeds total_shares {}",
            config.threshold, config.total_shares
        ));
    }
    if config.rounds == 0 {
        return invalid("rounds must be positive".to_string());
    }
    Ok(())
}
