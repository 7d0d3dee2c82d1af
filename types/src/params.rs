//! Consensus protocol parameters.
//!
//! Fractions are expressed in basis points (1 bps = 0.01%) so that stake and
//! money arithmetic stays integral.

use serde::{Deserialize, Serialize};

/// Denominator for every basis-point value.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Parameters shared by both consensus subsystems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Own stake below which a validator is deactivated.
    pub min_stake: u64,

    /// Stake cap `c` as a fraction of total stake (basis points).
    pub stake_cap_bps: u32,

    /// Seats per committee (per shard in the sharded network).
    pub committee_size: usize,

    /// Maximum transactions held by one mempool.
    pub mempool_capacity: usize,

    /// Maximum serialized transaction bytes per block.
    pub max_block_bytes: usize,

    /// Reward credited to the proposer of each accepted block.
    pub block_reward: u64,

    /// Fraction of stake burned when a proposer's block is rejected (basis points).
    pub slash_bps: u32,

    /// Blocks on top of (and including) the containing block before a
    /// transaction counts as confirmed on the chain network.
    pub confirmation_depth: u64,

    /// Highest KYC level the simulated compliance provider can attest.
    pub kyc_ceiling: u8,

    /// Number of shards in the sharded network.
    pub shard_count: u32,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            min_stake: 1_000,
            stake_cap_bps: 2_500,
            committee_size: 4,
            mempool_capacity: 10_000,
            max_block_bytes: 64 * 1024,
            block_reward: 100,
            slash_bps: 1_000,
            confirmation_depth: 1,
            kyc_ceiling: 3,
            shard_count: 4,
        }
    }
}

impl ProtocolParams {
    /// Check internal consistency. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.stake_cap_bps == 0 || self.stake_cap_bps as u128 > BPS_DENOMINATOR {
            return Err(format!(
                "stake_cap_bps must be in 1..=10000, got {}",
                self.stake_cap_bps
            ));
        }
        if self.slash_bps as u128 > BPS_DENOMINATOR {
            return Err(format!("slash_bps must be <= 10000, got {}", self.slash_bps));
        }
        if self.committee_size == 0 {
            return Err("committee_size must be non-zero".into());
        }
        if self.mempool_capacity == 0 {
            return Err("mempool_capacity must be non-zero".into());
        }
        if self.shard_count == 0 {
            return Err("shard_count must be non-zero".into());
        }
        if self.confirmation_depth == 0 {
            return Err("confirmation_depth must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ProtocolParams::default().validate().is_ok());
    }

    #[test]
    fn cap_above_one_is_rejected() {
        let params = ProtocolParams {
            stake_cap_bps: 10_001,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_shards_rejected() {
        let params = ProtocolParams {
            shard_count: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
