//! Consensus building blocks shared by the sharded and single-chain networks.
//!
//! - [`ValidatorSet`]: registration, delegation, rewards, slashing
//! - [`selection`]: stake-capped, VRF-weighted committee and proposer choice
//! - [`Epoch`]: per-shard committees and the global state root
//! - [`SequencerAuction`]: sealed-bid MEV auction per shard slot
//! - [`revenue`]: auction revenue split

pub mod auction;
pub mod epoch;
pub mod error;
pub mod math;
pub mod revenue;
pub mod selection;
pub mod validator;
pub mod validator_set;

pub use auction::{bid_commitment, AuctionOutcome, AuctionPhase, SequencerAuction};
pub use epoch::Epoch;
pub use error::ConsensusError;
pub use revenue::{split_revenue, Beneficiary, RevenueDistribution, RevenueShare, RevenueSplitConfig};
pub use selection::{effective_stakes, select_committee, select_proposer};
pub use validator::{SlashRecord, Validator};
pub use validator_set::{RewardDistribution, ValidatorSet};
