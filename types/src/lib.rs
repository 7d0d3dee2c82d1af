//! Fundamental types for the DualNet settlement layer.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: identities, hashes, amounts, keys, timestamps, protocol
//! parameters and the settlement/payment status machines.

pub mod amount;
pub mod block;
pub mod currency;
pub mod hash;
pub mod ids;
pub mod keys;
pub mod network;
pub mod params;
pub mod state;
pub mod time;

pub use amount::Amount;
pub use block::BlockHash;
pub use currency::CurrencyPair;
pub use hash::TxHash;
pub use ids::{ParticipantId, PaymentId, SettlementId, ShardId, ValidatorId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature, SignatureAlgorithm};
pub use network::NetworkKind;
pub use params::ProtocolParams;
pub use state::{PaymentStatus, SettlementStatus};
pub use time::{Clock, SystemClock, Timestamp};
