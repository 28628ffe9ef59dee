//! Randomness source abstraction
//!
//! The engine never consumes entropy directly. It asks a beacon for
//! the seed associated with a past timeline position; the beacon must
//! answer deterministically, so a draw executed late produces exactly
//! the value it would have produced at the end block.

use crate::types::BlockHeight;
use sha2::{Digest, Sha256};

/// Deterministic seed source keyed by timeline position
///
/// Implementations must be pure: the same height always yields the
/// same seed, regardless of when or how often it is queried. In
/// production this is backed by a verifiable-random-function oracle;
/// tests and simulations use [`FixedBeacon`] or [`HashBeacon`].
pub trait RandomnessBeacon: std::fmt::Debug {
    /// Seed associated with the given height
    fn seed_at(&self, height: BlockHeight) -> u128;
}

/// Beacon deriving seeds by hashing a secret with the height
///
/// SHA-256 over `secret || height`, truncated to 128 bits. Distinct
/// heights yield independent-looking seeds while staying repeatable.
#[derive(Debug, Clone)]
pub struct HashBeacon {
    secret: [u8; 32],
}

impl HashBeacon {
    /// Create a beacon with an explicit secret
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Create a beacon with a randomly drawn secret
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { secret }
    }
}

impl RandomnessBeacon for HashBeacon {
    fn seed_at(&self, height: BlockHeight) -> u128 {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(height.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        u128::from_le_bytes(bytes)
    }
}

/// Beacon returning one fixed seed for every height
///
/// Lets tests choose the drawn number exactly.
#[derive(Debug, Clone, Copy)]
pub struct FixedBeacon(u128);

impl FixedBeacon {
    /// Create a beacon that always yields `seed`
    pub fn new(seed: u128) -> Self {
        Self(seed)
    }
}

impl RandomnessBeacon for FixedBeacon {
    fn seed_at(&self, _height: BlockHeight) -> u128 {
        self.0
    }
}

/// Truncate a seed to its lowest `difficulty` decimal digits
///
/// Numeric modulo, not string truncation: with difficulty 5 a seed
/// may legitimately draw `32` (high digits of the truncated value are
/// zero). Comparisons against ticket numbers must therefore use
/// numeric equality, never zero-padded strings.
pub fn truncate_seed(seed: u128, difficulty: u8) -> u64 {
    debug_assert!((1..=10).contains(&difficulty));
    let modulus = 10u128.pow(u32::from(difficulty));
    (seed % modulus) as u64
}
