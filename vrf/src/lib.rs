//! Verifiable Random Function (VRF) for fair validator selection.
//!
//! Two providers implement [`VrfProvider`]:
//! - [`KeyedVrf`]: a validator's own VRF: output is a hash of a
//!   deterministic signature, the signature is the proof.
//! - [`SeedBeacon`]: public randomness derived from an epoch seed, used when
//!   every node must reproduce the same selection from the seed alone.
//!
//! Scores derived from outputs are only ever compared with each other or
//! multiplied into integer weights; they never flow back into money.

pub mod beacon;
pub mod error;
pub mod keyed;

pub use beacon::SeedBeacon;
pub use error::VrfError;
pub use keyed::{vrf_prove, vrf_verify, KeyedVrf};

/// Trait for providing verifiable randomness.
pub trait VrfProvider: Send + Sync {
    /// Get randomness for a given context (e.g. seed ‖ validator id).
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError>;

    /// Verify that a randomness output was correctly generated.
    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError>;

    /// Human-readable name of this VRF provider.
    fn name(&self) -> &str;
}

/// The output of a VRF: a random value with its proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomOutput {
    /// The random bytes (32 bytes).
    pub value: [u8; 32],
    /// Proof that the value was correctly generated.
    pub proof: Vec<u8>,
    /// Epoch or round the output belongs to.
    pub round: u64,
}

/// Top 64 bits of a VRF output, for integer weight arithmetic.
pub fn score_u64(value: &[u8; 32]) -> u64 {
    let mut top = [0u8; 8];
    top.copy_from_slice(&value[..8]);
    u64::from_be_bytes(top)
}

/// VRF output normalized to `[0, 1)` using its top 53 bits.
pub fn normalized_score(value: &[u8; 32]) -> f64 {
    const MANTISSA: f64 = (1u64 << 53) as f64;
    (score_u64(value) >> 11) as f64 / MANTISSA
}
