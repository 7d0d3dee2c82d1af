//! Cryptographic primitives for DualNet.
//!
//! - **Ed25519** and **Ed25519ph** for signing; the algorithm tag travels
//!   with every key and signature
//! - **Blake2b-256** for hashing (transaction ids, block hashes, VRF outputs)
//! - Domain-separated binary **Merkle roots** over transaction hashes
//! - A [`Signer`] seam so validators and connectors never hold raw keys

pub mod encoding;
pub mod error;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod sign;
pub mod signer;

pub use encoding::CanonicalEncoder;
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, hash_domain};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use merkle::{merkle_root, EMPTY_MERKLE_ROOT_TAG};
pub use sign::{sign_message, verify_signature};
pub use signer::{LocalSigner, Signer};
