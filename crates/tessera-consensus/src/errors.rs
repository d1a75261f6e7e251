// Consensus layer errors.
//
// SAFETY: every error is returned to the immediate caller. Nothing in this
// crate retries, clamps or logs-and-continues.

use crate::validator::ValidatorId;
use thiserror::Error;

/// Coarse classification used by callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    ArithmeticOverflow,
    ConsistencyViolation,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("validator set is empty")]
    EmptyValidatorSet,

    #[error("invalid validator counts: {byzantine} byzantine out of {total} total")]
    InvalidValidatorCount { total: usize, byzantine: usize },

    #[error("duplicate validator id {0}")]
    DuplicateValidatorId(ValidatorId),

    #[error("invalid stake policy: {0}")]
    InvalidPolicy(String),

    #[error("stake of validator {validator_id} overflowed applying delta {delta}")]
    ArithmeticOverflow { validator_id: ValidatorId, delta: i64 },

    #[error(
        "quorum rule diverged for {validators} validators: vote threshold {vote_threshold}, minimum honest {minimum_honest}"
    )]
    ConsistencyViolation {
        validators: usize,
        vote_threshold: usize,
        minimum_honest: usize,
    },
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            ConsensusError::ConsistencyViolation { .. } => ErrorKind::ConsistencyViolation,
            _ => ErrorKind::InvalidInput,
        }
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
