//! Stake registry: registration, delegation, rewards and slashing.
//!
//! Validators are kept in a `BTreeMap` so iteration is in lexicographic id
//! order, the canonical enumeration order for every tie-break.

use std::collections::BTreeMap;

use dualnet_types::params::BPS_DENOMINATOR;
use dualnet_types::{Amount, BlockHash, ProtocolParams, PublicKey, Timestamp, ValidatorId};
use tracing::{info, warn};

use crate::math::{apply_bps, pro_rata};
use crate::{ConsensusError, SlashRecord, Validator};

/// Result of a reward distribution: per-validator credits plus the rounding
/// remainder nobody received.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardDistribution {
    pub credits: Vec<(ValidatorId, Amount)>,
    pub undistributed: Amount,
}

pub struct ValidatorSet {
    validators: BTreeMap<ValidatorId, Validator>,
    min_stake: Amount,
    slash_bps: u32,
}

impl ValidatorSet {
    pub fn new(min_stake: Amount, slash_bps: u32) -> Self {
        Self {
            validators: BTreeMap::new(),
            min_stake,
            slash_bps,
        }
    }

    pub fn from_params(params: &ProtocolParams) -> Self {
        Self::new(Amount::new(u128::from(params.min_stake)), params.slash_bps)
    }

    pub fn register(
        &mut self,
        id: ValidatorId,
        public_key: PublicKey,
        stake: Amount,
    ) -> Result<(), ConsensusError> {
        if self.validators.contains_key(&id) {
            return Err(ConsensusError::AlreadyRegistered(id.to_string()));
        }
        if stake < self.min_stake {
            return Err(ConsensusError::InsufficientStake {
                have: stake.raw(),
                need: self.min_stake.raw(),
            });
        }
        info!(validator = %id, stake = %stake, "validator registered");
        self.validators
            .insert(id.clone(), Validator::new(id, public_key, stake));
        Ok(())
    }

    pub fn delegate(
        &mut self,
        id: &ValidatorId,
        delegator: PublicKey,
        amount: Amount,
    ) -> Result<(), ConsensusError> {
        let validator = self.get_mut(id)?;
        let entry = validator.delegations.entry(delegator).or_default();
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    pub fn set_performance(&mut self, id: &ValidatorId, bps: u32) -> Result<(), ConsensusError> {
        if u128::from(bps) > BPS_DENOMINATOR {
            return Err(ConsensusError::InvalidParameter(format!(
                "performance {bps} bps exceeds {BPS_DENOMINATOR}"
            )));
        }
        self.get_mut(id)?.performance_bps = bps;
        Ok(())
    }

    /// Split `reward` across active validators in proportion to bonded stake,
    /// crediting each validator's own stake.
    pub fn distribute_rewards(&mut self, reward: Amount) -> RewardDistribution {
        let total: u128 = self.active().map(|v| v.bonded_stake().raw()).sum();
        if total == 0 {
            return RewardDistribution {
                credits: Vec::new(),
                undistributed: reward,
            };
        }

        let mut credits = Vec::new();
        let mut paid = Amount::ZERO;
        for validator in self.validators.values_mut().filter(|v| v.active) {
            let share = Amount::new(pro_rata(reward.raw(), validator.bonded_stake().raw(), total));
            if share.is_zero() {
                continue;
            }
            validator.stake = validator.stake.saturating_add(share);
            paid = paid.saturating_add(share);
            credits.push((validator.id.clone(), share));
        }
        RewardDistribution {
            credits,
            undistributed: reward.saturating_sub(paid),
        }
    }

    /// Credit `amount` to one validator's own stake.
    pub fn reward(&mut self, id: &ValidatorId, amount: Amount) -> Result<(), ConsensusError> {
        let validator = self.get_mut(id)?;
        validator.stake = validator.stake.saturating_add(amount);
        Ok(())
    }

    /// Burn `slash_bps` of the validator's own stake, append to its history and
    /// deactivate it if the remainder is below the minimum. Returns the amount
    /// burned.
    pub fn slash(
        &mut self,
        id: &ValidatorId,
        reason: &str,
        block: Option<BlockHash>,
        at: Timestamp,
    ) -> Result<Amount, ConsensusError> {
        let min_stake = self.min_stake;
        let slash_bps = self.slash_bps;
        let validator = self.get_mut(id)?;

        let amount = Amount::new(apply_bps(validator.stake.raw(), slash_bps));
        validator.stake = validator.stake.saturating_sub(amount);
        validator.honest = false;
        validator.slashes.push(SlashRecord {
            amount,
            reason: reason.to_string(),
            block,
            at,
        });
        warn!(validator = %id, amount = %amount, reason, "validator slashed");

        if validator.active && validator.stake < min_stake {
            validator.active = false;
            warn!(validator = %id, stake = %validator.stake, "validator deactivated below minimum stake");
        }
        Ok(amount)
    }

    pub fn get(&self, id: &ValidatorId) -> Option<&Validator> {
        self.validators.get(id)
    }

    fn get_mut(&mut self, id: &ValidatorId) -> Result<&mut Validator, ConsensusError> {
        self.validators
            .get_mut(id)
            .ok_or_else(|| ConsensusError::UnknownValidator(id.to_string()))
    }

    /// Active validators in lexicographic id order.
    pub fn active(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values().filter(|v| v.active)
    }

    pub fn active_snapshot(&self) -> Vec<Validator> {
        self.active().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn min_stake(&self) -> Amount {
        self.min_stake
    }
}
