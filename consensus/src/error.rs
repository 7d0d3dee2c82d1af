use dualnet_vrf::VrfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("validator {0} already registered")]
    AlreadyRegistered(String),

    #[error("validator {0} not found")]
    UnknownValidator(String),

    #[error("insufficient stake: {have} < {need}")]
    InsufficientStake { have: u128, need: u128 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no active validators")]
    NoActiveValidators,

    #[error("shard {shard} out of range (shard count {count})")]
    ShardOutOfRange { shard: u32, count: u32 },

    #[error("shard {0} already finalized this epoch")]
    ShardAlreadyFinalized(u32),

    #[error("epoch {0} is not complete")]
    EpochIncomplete(u64),

    #[error("vrf: {0}")]
    Vrf(#[from] VrfError),
}
