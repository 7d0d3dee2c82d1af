//! Nullable randomness: scripted VRF outputs.

use std::sync::atomic::{AtomicUsize, Ordering};

use dualnet_vrf::{RandomOutput, VrfError, VrfProvider};

/// Returns pre-configured values in order, cycling when exhausted.
pub struct NullRandom {
    outputs: Vec<[u8; 32]>,
    index: AtomicUsize,
}

impl NullRandom {
    /// An empty sequence behaves like `constant([0; 32])`.
    pub fn new(outputs: Vec<[u8; 32]>) -> Self {
        let outputs = if outputs.is_empty() { vec![[0u8; 32]] } else { outputs };
        Self {
            outputs,
            index: AtomicUsize::new(0),
        }
    }

    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }

    /// Number of outputs handed out so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

impl VrfProvider for NullRandom {
    fn get_randomness(&self, _context: &[u8]) -> Result<RandomOutput, VrfError> {
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        let current = idx % self.outputs.len();
        Ok(RandomOutput {
            value: self.outputs[current],
            proof: Vec::new(),
            round: current as u64,
        })
    }

    fn verify(&self, _context: &[u8], _output: &RandomOutput) -> Result<bool, VrfError> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "null-random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_outputs() {
        let rng = NullRandom::new(vec![[1; 32], [2; 32]]);
        assert_eq!(rng.get_randomness(b"a").unwrap().value, [1; 32]);
        assert_eq!(rng.get_randomness(b"b").unwrap().value, [2; 32]);
        assert_eq!(rng.get_randomness(b"c").unwrap().value, [1; 32]);
        assert_eq!(rng.calls(), 3);
    }
}
