// Error types for the cryptographic layer.
//
// SAFETY INVARIANTS:
// 1. Every malformed input is surfaced to the caller, never silently corrected
// 2. Field arithmetic cannot overflow: residues are u64 and every product is
//    taken in u128, so no variant exists for it here

use thiserror::Error;

/// Errors raised by field arithmetic, sharing, reconstruction and rotation.
///
/// Every variant describes invalid input; none of them is transient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("modulus {0} is not prime")]
    NonPrimeModulus(u64),

    #[error("zero has no multiplicative inverse")]
    ZeroHasNoInverse,

    #[error("invalid threshold {threshold} for {total_shares} shares (need 1 <= threshold <= total_shares)")]
    InvalidThreshold { threshold: u32, total_shares: u32 },

    #[error("cannot issue {total_shares} shares over modulus {modulus} (at most modulus - 1)")]
    TooManyShares { total_shares: u32, modulus: u64 },

    #[error("value {value} is outside the field [0, {modulus})")]
    ValueOutOfRange { value: u64, modulus: u64 },

    #[error("share index {0} is not a valid evaluation point")]
    InvalidShareIndex(u64),

    #[error("duplicate share index {0}")]
    DuplicateShareIndex(u64),

    #[error("insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    #[error("shares were issued under different thresholds")]
    InconsistentShares,

    #[error("no input points supplied")]
    EmptyInput,

    #[error("invalid secret range [{start}, {end}] for modulus {modulus}")]
    InvalidSecretRange { start: u64, end: u64, modulus: u64 },
}

pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CryptoError::InsufficientShares { got: 2, need: 3 };
        let msg = err.to_string();
        assert!(msg.contains("got 2"));
        assert!(msg.contains("need 3"));
    }
}
