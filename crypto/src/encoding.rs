//! Canonical byte encoding for content hashing.
//!
//! Every field is written in a fixed order with fixed-width little-endian
//! integers, length-prefixed byte strings and an explicit presence tag for
//! optional values, so two values hash equal only if every field, present or
//! absent, is equal.

use dualnet_types::{PublicKey, Signature, SignatureAlgorithm};

use crate::blake2b_256;

pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Start an encoding under a domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut enc = Self {
            buf: Vec::with_capacity(256),
        };
        enc.bytes(domain);
        enc
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u128(&mut self, v: u128) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Length-prefixed byte string.
    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.u32(v.len() as u32);
        self.buf.extend_from_slice(v);
        self
    }

    pub fn fixed(&mut self, v: &[u8; 32]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    pub fn str(&mut self, v: &str) -> &mut Self {
        self.bytes(v.as_bytes())
    }

    pub fn public_key(&mut self, key: &PublicKey) -> &mut Self {
        self.u8(algorithm_tag(key.algorithm)).fixed(&key.bytes)
    }

    pub fn signature(&mut self, sig: &Signature) -> &mut Self {
        self.u8(algorithm_tag(sig.algorithm));
        self.buf.extend_from_slice(&sig.bytes);
        self
    }

    /// Presence tag (0 = absent, 1 = present) followed by the value.
    pub fn option<T>(&mut self, value: Option<&T>, write: impl FnOnce(&mut Self, &T)) -> &mut Self {
        match value {
            None => {
                self.u8(0);
            }
            Some(v) => {
                self.u8(1);
                write(self, v);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Blake2b-256 of everything written so far.
    pub fn digest(&self) -> [u8; 32] {
        blake2b_256(&self.buf)
    }
}

fn algorithm_tag(algorithm: SignatureAlgorithm) -> u8 {
    match algorithm {
        SignatureAlgorithm::Ed25519 => 0,
        SignatureAlgorithm::Ed25519ph => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_option_differ() {
        let mut a = CanonicalEncoder::new(b"t");
        a.option(None::<&String>, |e, s| {
            e.str(s);
        });
        let mut b = CanonicalEncoder::new(b"t");
        b.option(Some(&String::new()), |e, s| {
            e.str(s);
        });
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn length_prefix_prevents_shifting() {
        let mut a = CanonicalEncoder::new(b"t");
        a.str("ab").str("c");
        let mut b = CanonicalEncoder::new(b"t");
        b.str("a").str("bc");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn domain_separates() {
        let mut a = CanonicalEncoder::new(b"tx");
        a.u64(1);
        let mut b = CanonicalEncoder::new(b"block");
        b.u64(1);
        assert_ne!(a.digest(), b.digest());
    }
}
