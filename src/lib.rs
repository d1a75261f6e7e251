//! Tessera validator network core.
//!
//! Re-exports the two library crates:
//! - [`crypto`]: prime-field arithmetic, Shamir secret sharing, key rotation
//! - [`consensus`]: Byzantine quorum, validator behavior, validator set

pub use tessera_consensus as consensus;
pub use tessera_crypto as crypto;
