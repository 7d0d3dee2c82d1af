//! A staking validator.

use std::collections::BTreeMap;

use dualnet_types::params::BPS_DENOMINATOR;
use dualnet_types::{Amount, BlockHash, PublicKey, Timestamp, ValidatorId};
use serde::{Deserialize, Serialize};

/// One entry in a validator's append-only slashing history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashRecord {
    pub amount: Amount,
    pub reason: String,
    pub block: Option<BlockHash>,
    pub at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub public_key: PublicKey,
    /// Own stake. Checked against the network minimum.
    pub stake: Amount,
    /// Delegator key → delegated amount.
    pub delegations: BTreeMap<PublicKey, Amount>,
    pub slashes: Vec<SlashRecord>,
    /// Cleared on the first slash.
    pub honest: bool,
    /// Multiplier applied to effective stake, in basis points.
    pub performance_bps: u32,
    pub active: bool,
}

impl Validator {
    pub fn new(id: ValidatorId, public_key: PublicKey, stake: Amount) -> Self {
        Self {
            id,
            public_key,
            stake,
            delegations: BTreeMap::new(),
            slashes: Vec::new(),
            honest: true,
            performance_bps: BPS_DENOMINATOR as u32,
            active: true,
        }
    }

    pub fn delegated(&self) -> Amount {
        self.delegations.values().copied().sum()
    }

    /// Own stake plus delegations. This is the weight used for selection.
    pub fn bonded_stake(&self) -> Amount {
        self.stake.saturating_add(self.delegated())
    }

    pub fn total_slashed(&self) -> Amount {
        self.slashes.iter().map(|s| s.amount).sum()
    }
}
