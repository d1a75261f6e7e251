// Shamir threshold secret sharing over GF(p)
//
// SAFETY INVARIANTS:
// 1. Share index 0 is never issued (f(0) is the secret itself)
// 2. Any `threshold` shares of one batch reconstruct the secret exactly
// 3. Fewer than `threshold` shares are information-theoretically independent
//    of the secret: every non-constant coefficient is uniform over the field
// 4. Coefficients come from an injected CSPRNG and are wiped after use
// 5. Reconstruction validates every share before interpolating

use crate::errors::{CryptoError, CryptoResult};
use crate::field::{FieldElement, PrimeField};
use log::debug;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use zeroize::Zeroizing;

/// One evaluation of the sharing polynomial.
///
/// A share is only meaningful together with other shares from the same
/// batch; the recorded `threshold` lets reconstruction refuse short sets
/// without the caller restating the scheme parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Share {
    /// Evaluation point, in [1, total_shares]
    pub index: u32,

    /// Polynomial value at `index`
    pub value: FieldElement,

    /// Number of shares required to reconstruct
    pub threshold: u32,
}

/// Validate `(total_shares, threshold)` against a field.
pub fn validate_parameters(
    total_shares: u32,
    threshold: u32,
    field: &PrimeField,
) -> CryptoResult<()> {
    if threshold < 1 || total_shares < threshold {
        return Err(CryptoError::InvalidThreshold {
            threshold,
            total_shares,
        });
    }
    if total_shares as u64 > field.modulus() - 1 {
        return Err(CryptoError::TooManyShares {
            total_shares,
            modulus: field.modulus(),
        });
    }
    Ok(())
}

/// Split `secret` into `total_shares` shares, any `threshold` of which
/// reconstruct it.
///
/// # Errors
/// - `InvalidThreshold` if `threshold < 1` or `total_shares < threshold`
/// - `TooManyShares` if `total_shares > p - 1`
/// - `ValueOutOfRange` if `secret >= p` (the secret is never reduced silently)
pub fn create_shares<R>(
    secret: u64,
    total_shares: u32,
    threshold: u32,
    field: &PrimeField,
    rng: &mut R,
) -> CryptoResult<Vec<Share>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    validate_parameters(total_shares, threshold, field)?;
    let secret = field.element(secret)?;

    let mut coefficients = Zeroizing::new(Vec::with_capacity(threshold as usize));
    coefficients.push(secret);
    for _ in 1..threshold {
        coefficients.push(field.random_element(rng));
    }

    let shares = (1..=total_shares)
        .map(|index| Share {
            index,
            value: field.evaluate(&coefficients, field.reduce(index as u64)),
            threshold,
        })
        .collect();

    debug!(
        "Issued {} shares (threshold {}) over {}",
        total_shares, threshold, field
    );

    Ok(shares)
}

/// Recover the secret from at least `threshold` shares of one batch.
///
/// Every supplied share takes part in the interpolation; over-provisioned
/// sets yield the same value as any minimal subset.
///
/// # Errors
/// - `InsufficientShares` for an empty set or fewer than `threshold` shares
/// - `InconsistentShares` when shares disagree on their threshold
/// - `InvalidShareIndex` for index 0 or an index outside the field
/// - `DuplicateShareIndex` when two shares have the same index
/// - `ValueOutOfRange` for a value that is not a residue of `field`
pub fn reconstruct_secret(shares: &[Share], field: &PrimeField) -> CryptoResult<FieldElement> {
    let points = share_points(shares, field)?;
    field.lagrange_at_zero(&points)
}

/// Validate a share set and convert it to interpolation points.
pub(crate) fn share_points(
    shares: &[Share],
    field: &PrimeField,
) -> CryptoResult<Vec<(FieldElement, FieldElement)>> {
    let first = shares.first().ok_or(CryptoError::InsufficientShares {
        got: 0,
        need: 1,
    })?;
    let threshold = first.threshold;

    if threshold < 1 {
        return Err(CryptoError::InvalidThreshold {
            threshold,
            total_shares: u32::try_from(shares.len()).unwrap_or(u32::MAX),
        });
    }
    if shares.iter().any(|s| s.threshold != threshold) {
        return Err(CryptoError::InconsistentShares);
    }
    if shares.len() < threshold as usize {
        return Err(CryptoError::InsufficientShares {
            got: shares.len(),
            need: threshold as usize,
        });
    }

    let mut seen = BTreeSet::new();
    let mut points = Vec::with_capacity(shares.len());
    for share in shares {
        let index = share.index as u64;
        if index == 0 || index >= field.modulus() {
            return Err(CryptoError::InvalidShareIndex(index));
        }
        if !seen.insert(share.index) {
            return Err(CryptoError::DuplicateShareIndex(index));
        }
        if !field.contains(share.value) {
            return Err(CryptoError::ValueOutOfRange {
                value: share.value.value(),
                modulus: field.modulus(),
            });
        }
        points.push((field.element(index)?, share.value));
    }

    Ok(points)
}

/// A fixed `(total_shares, threshold)` scheme over one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSharing {
    field: PrimeField,
    total_shares: u32,
    threshold: u32,
}

impl SecretSharing {
    pub fn new(total_shares: u32, threshold: u32, field: PrimeField) -> CryptoResult<Self> {
        validate_parameters(total_shares, threshold, &field)?;
        Ok(SecretSharing {
            field,
            total_shares,
            threshold,
        })
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    pub fn total_shares(&self) -> u32 {
        self.total_shares
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn split<R>(&self, secret: u64, rng: &mut R) -> CryptoResult<Vec<Share>>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        create_shares(secret, self.total_shares, self.threshold, &self.field, rng)
    }

    /// Reconstruct, additionally requiring the shares to belong to this scheme.
    pub fn combine(&self, shares: &[Share]) -> CryptoResult<FieldElement> {
        if shares.iter().any(|s| s.threshold != self.threshold) {
            return Err(CryptoError::InconsistentShares);
        }
        if let Some(share) = shares.iter().find(|s| s.index > self.total_shares) {
            return Err(CryptoError::InvalidShareIndex(share.index as u64));
        }
        reconstruct_secret(shares, &self.field)
    }
}
