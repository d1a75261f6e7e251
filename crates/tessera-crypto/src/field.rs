// Prime field arithmetic GF(p)
// Foundation for share generation, reconstruction and rotation
//
// SAFETY INVARIANTS:
// 1. Every FieldElement handed out by a PrimeField lies in [0, p)
// 2. The modulus is prime (checked once, at construction)
// 3. Reduction is floor-style: negative inputs never produce negative residues
// 4. Products are computed in u128, so no intermediate value can wrap

use crate::errors::{CryptoError, CryptoResult};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// The field used by the first network deployment.
pub const LEGACY_MODULUS: u64 = 2087;

/// Mersenne prime 2^61 - 1. Large enough for 60-bit secrets and any
/// realistic share count.
pub const DEFAULT_MODULUS: u64 = (1 << 61) - 1;

/// Miller-Rabin witnesses that are deterministic for every n < 2^64.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// A residue modulo some prime p.
///
/// Only a [`PrimeField`] creates these, so the value is always reduced
/// with respect to the field that produced it. Mixing elements of two
/// different fields is a logic error the type does not prevent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Zeroize,
)]
#[serde(transparent)]
pub struct FieldElement(u64);

impl FieldElement {
    pub const ZERO: Self = FieldElement(0);
    pub const ONE: Self = FieldElement(1);

    /// Raw residue.
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FieldElement> for u64 {
    fn from(element: FieldElement) -> Self {
        element.0
    }
}

/// Arithmetic context for GF(p).
///
/// SAFETY: `new` is the only constructor and rejects composite moduli,
/// which is what makes [`PrimeField::inverse`] sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PrimeField {
    modulus: u64,
}

impl PrimeField {
    /// Create a field over `modulus`.
    ///
    /// # Errors
    /// `NonPrimeModulus` if `modulus` is not prime.
    pub fn new(modulus: u64) -> CryptoResult<Self> {
        if !is_prime(modulus) {
            return Err(CryptoError::NonPrimeModulus(modulus));
        }
        Ok(PrimeField { modulus })
    }

    /// The 2087 field the network first shipped with.
    pub fn legacy() -> Self {
        PrimeField {
            modulus: LEGACY_MODULUS,
        }
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Map any signed integer into [0, p) using floor-style modulo.
    pub fn normalize(&self, x: i128) -> FieldElement {
        FieldElement(x.rem_euclid(self.modulus as i128) as u64)
    }

    /// Reduce an unsigned integer into [0, p).
    pub fn reduce(&self, x: u64) -> FieldElement {
        FieldElement(x % self.modulus)
    }

    /// Checked constructor: accepts only values already inside the field.
    pub fn element(&self, value: u64) -> CryptoResult<FieldElement> {
        if value >= self.modulus {
            return Err(CryptoError::ValueOutOfRange {
                value,
                modulus: self.modulus,
            });
        }
        Ok(FieldElement(value))
    }

    /// Whether `element` is a residue of this field. Deserialized shares
    /// bypass the checked constructors, so they are checked with this.
    pub fn contains(&self, element: FieldElement) -> bool {
        element.0 < self.modulus
    }

    pub fn add(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        let sum = (a.0 as u128 + b.0 as u128) % self.modulus as u128;
        FieldElement(sum as u64)
    }

    pub fn sub(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        let p = self.modulus as u128;
        let diff = (a.0 as u128 % p + p - b.0 as u128 % p) % p;
        FieldElement(diff as u64)
    }

    pub fn neg(&self, a: FieldElement) -> FieldElement {
        self.sub(FieldElement::ZERO, a)
    }

    pub fn mul(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        FieldElement(mul_mod(a.0, b.0, self.modulus))
    }

    /// Square-and-multiply exponentiation.
    pub fn pow(&self, base: FieldElement, exponent: u64) -> FieldElement {
        FieldElement(pow_mod(base.0, exponent, self.modulus))
    }

    /// Multiplicative inverse via Fermat's little theorem: a^(p-2).
    ///
    /// # Errors
    /// `ZeroHasNoInverse` when `a ≡ 0 (mod p)`.
    pub fn inverse(&self, a: FieldElement) -> CryptoResult<FieldElement> {
        if a.0 % self.modulus == 0 {
            return Err(CryptoError::ZeroHasNoInverse);
        }
        Ok(self.pow(a, self.modulus - 2))
    }

    /// Evaluate `coefficients[0] + coefficients[1]·x + ...` with Horner's rule.
    pub fn evaluate(&self, coefficients: &[FieldElement], x: FieldElement) -> FieldElement {
        coefficients
            .iter()
            .rev()
            .fold(FieldElement::ZERO, |acc, &c| self.add(self.mul(acc, x), c))
    }

    /// Interpolate f(0) from `(x, y)` points of a polynomial.
    ///
    /// For each point i the contribution is
    /// `y_i · Π_{j≠i}(0 - x_j) · inverse(Π_{j≠i}(x_i - x_j))`.
    ///
    /// This does no threshold bookkeeping: with fewer points than the
    /// polynomial's degree + 1 the result is simply a different value.
    ///
    /// # Errors
    /// - `EmptyInput` for an empty slice
    /// - `DuplicateShareIndex` if two points share an x coordinate
    pub fn lagrange_at_zero(
        &self,
        points: &[(FieldElement, FieldElement)],
    ) -> CryptoResult<FieldElement> {
        if points.is_empty() {
            return Err(CryptoError::EmptyInput);
        }

        let mut secret = FieldElement::ZERO;
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut numerator = FieldElement::ONE;
            let mut denominator = FieldElement::ONE;

            for (j, &(xj, _)) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                if xi == xj {
                    return Err(CryptoError::DuplicateShareIndex(xi.0));
                }
                numerator = self.mul(numerator, self.neg(xj));
                denominator = self.mul(denominator, self.sub(xi, xj));
            }

            let term = self.mul(self.mul(yi, numerator), self.inverse(denominator)?);
            secret = self.add(secret, term);
        }

        Ok(secret)
    }

    /// Uniformly random element drawn from the supplied CSPRNG.
    pub fn random_element<R>(&self, rng: &mut R) -> FieldElement
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        FieldElement(rng.gen_range(0..self.modulus))
    }
}

impl Default for PrimeField {
    fn default() -> Self {
        PrimeField {
            modulus: DEFAULT_MODULUS,
        }
    }
}

impl TryFrom<u64> for PrimeField {
    type Error = CryptoError;

    fn try_from(modulus: u64) -> Result<Self, Self::Error> {
        PrimeField::new(modulus)
    }
}

impl From<PrimeField> for u64 {
    fn from(field: PrimeField) -> Self {
        field.modulus
    }
}

impl fmt::Display for PrimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GF({})", self.modulus)
    }
}

#[inline]
fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(base: u64, mut exponent: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % m;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exponent >>= 1;
    }
    result
}

/// Deterministic Miller-Rabin primality test for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}
