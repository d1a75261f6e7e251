//! Quorum layer of the Tessera validator network.
//!
//! [`quorum`] owns the one Byzantine fraction used anywhere in the crate;
//! [`validator`] describes what a single validator does each round;
//! [`validator_set`] runs rounds, votes on blocks and manages membership.

pub mod errors;
pub mod quorum;
pub mod validator;
pub mod validator_set;

pub use errors::{ConsensusError, ConsensusResult, ErrorKind};
pub use quorum::{check_consistency, has_quorum, max_tolerated_faults, minimum_honest, tolerates};
pub use validator::{ActionRecord, StakePolicy, Validator, ValidatorAction, ValidatorId, VoteOutcome};
pub use validator_set::{
    evaluate_round, manage_membership, vote_on_block, BlockDecision, MembershipChanges,
    MembershipUpdate, RoundVote, ValidatorSet, VoteTally,
};
