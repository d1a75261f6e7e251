// Key rotation and proactive share refresh
//
// SAFETY INVARIANTS:
// 1. Rotation is stateless: nothing survives between two calls
// 2. A rotated secret always lies inside the configured range and the field
// 3. Refresh never reconstructs the secret; it adds a zero-constant polynomial
// 4. After rotation or refresh the caller must discard every older share

use crate::errors::{CryptoError, CryptoResult};
use crate::field::{FieldElement, PrimeField};
use crate::secret_sharing::{create_shares, share_points, validate_parameters, Share};
use log::debug;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Inclusive range fresh secrets are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRange {
    pub start: u64,
    pub end: u64,
}

impl SecretRange {
    /// Four-digit secrets, as issued by the network since launch.
    pub const LEGACY: SecretRange = SecretRange {
        start: 1000,
        end: 9999,
    };

    /// The legacy range if the field can hold it, otherwise every non-zero
    /// residue of the field.
    pub fn default_for(field: &PrimeField) -> Self {
        if Self::LEGACY.end < field.modulus() {
            Self::LEGACY
        } else {
            SecretRange {
                start: 1,
                end: field.modulus() - 1,
            }
        }
    }

    fn validate(&self, field: &PrimeField) -> CryptoResult<()> {
        if self.start > self.end || self.end >= field.modulus() {
            return Err(CryptoError::InvalidSecretRange {
                start: self.start,
                end: self.end,
                modulus: field.modulus(),
            });
        }
        Ok(())
    }
}

/// Output of a rotation: the new secret and its freshly issued shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatedKey {
    pub secret: FieldElement,
    pub shares: Vec<Share>,
}

/// Draws fresh secrets and shares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRotator {
    field: PrimeField,
    range: SecretRange,
}

impl KeyRotator {
    pub fn new(field: PrimeField, range: SecretRange) -> CryptoResult<Self> {
        range.validate(&field)?;
        Ok(KeyRotator { field, range })
    }

    pub fn with_default_range(field: PrimeField) -> Self {
        KeyRotator {
            field,
            range: SecretRange::default_for(&field),
        }
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    pub fn range(&self) -> SecretRange {
        self.range
    }

    /// Draw a new secret and split it into `total_shares` shares.
    ///
    /// Parameters are validated before any randomness is consumed.
    pub fn rotate<R>(&self, total_shares: u32, threshold: u32, rng: &mut R) -> CryptoResult<RotatedKey>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        validate_parameters(total_shares, threshold, &self.field)?;

        let secret = rng.gen_range(self.range.start..=self.range.end);
        let shares = create_shares(secret, total_shares, threshold, &self.field, rng)?;

        debug!(
            "Rotated key: {} new shares (threshold {}) over {}",
            total_shares, threshold, self.field
        );

        Ok(RotatedKey {
            secret: self.field.element(secret)?,
            shares,
        })
    }
}

/// Rotate with the default secret range for `field`.
pub fn rotate<R>(
    total_shares: u32,
    threshold: u32,
    field: &PrimeField,
    rng: &mut R,
) -> CryptoResult<RotatedKey>
where
    R: RngCore + CryptoRng + ?Sized,
{
    KeyRotator::with_default_range(*field).rotate(total_shares, threshold, rng)
}

/// Re-randomize a share set without changing the secret it encodes.
///
/// Each share becomes `y + g(x)` where `g` is a fresh random polynomial of
/// degree `threshold - 1` with `g(0) = 0`. Old and refreshed shares must
/// never be mixed in one reconstruction.
///
/// # Errors
/// Same validation as reconstruction: the set must hold at least
/// `threshold` consistent shares with distinct, valid indices.
pub fn refresh_shares<R>(shares: &[Share], field: &PrimeField, rng: &mut R) -> CryptoResult<Vec<Share>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let points = share_points(shares, field)?;
    let threshold = shares[0].threshold;

    let mut mask = Zeroizing::new(Vec::with_capacity(threshold as usize));
    mask.push(FieldElement::ZERO);
    for _ in 1..threshold {
        mask.push(field.random_element(rng));
    }

    let refreshed = shares
        .iter()
        .zip(points)
        .map(|(share, (x, y))| Share {
            index: share.index,
            value: field.add(y, field.evaluate(&mask, x)),
            threshold,
        })
        .collect();

    debug!("Refreshed {} shares (threshold {})", shares.len(), threshold);

    Ok(refreshed)
}
