//! Cryptographic layer of the Tessera validator network.
//!
//! - [`field`]: arithmetic over a configurable prime field GF(p)
//! - [`secret_sharing`]: Shamir threshold sharing and Lagrange reconstruction
//! - [`key_rotation`]: fresh secrets on demand and proactive share refresh
//!
//! Randomness is always injected by the caller through the `rand`
//! `RngCore + CryptoRng` bounds. Production callers pass an OS-seeded
//! generator; tests pass a seeded `StdRng` for reproducibility.
//!
//! Nothing here authenticates shares or proves they were generated
//! correctly; the crate assumes an honest dealer.

pub mod errors;
pub mod field;
pub mod key_rotation;
pub mod secret_sharing;

pub use errors::{CryptoError, CryptoResult};
pub use field::{is_prime, FieldElement, PrimeField, DEFAULT_MODULUS, LEGACY_MODULUS};
pub use key_rotation::{refresh_shares, rotate, KeyRotator, RotatedKey, SecretRange};
pub use secret_sharing::{create_shares, reconstruct_secret, SecretSharing, Share};
