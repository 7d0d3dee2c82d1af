//! Auction revenue split.
//!
//! A winning bid is divided four ways (defaults in parentheses): treasury
//! (10%), validators by effective stake (40%), a pro-rata rebate to pending
//! senders on the shard (30%) and the winning proposer (20%). Every share is
//! recorded individually. Integer rounding dust goes to the treasury so the
//! shares always sum to the bid exactly.

use dualnet_types::params::BPS_DENOMINATOR;
use dualnet_types::{Amount, PublicKey, ValidatorId};
use serde::{Deserialize, Serialize};

use crate::math::{apply_bps, pro_rata};
use crate::ConsensusError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSplitConfig {
    pub treasury_bps: u32,
    pub validators_bps: u32,
    pub rebate_bps: u32,
    pub proposer_bps: u32,
}

impl Default for RevenueSplitConfig {
    fn default() -> Self {
        Self {
            treasury_bps: 1_000,
            validators_bps: 4_000,
            rebate_bps: 3_000,
            proposer_bps: 2_000,
        }
    }
}

impl RevenueSplitConfig {
    pub fn validate(&self) -> Result<(), ConsensusError> {
        let sum = u128::from(self.treasury_bps)
            + u128::from(self.validators_bps)
            + u128::from(self.rebate_bps)
            + u128::from(self.proposer_bps);
        if sum != BPS_DENOMINATOR {
            return Err(ConsensusError::InvalidParameter(format!(
                "revenue split sums to {sum} bps, expected {BPS_DENOMINATOR}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Beneficiary {
    Treasury,
    Validator(ValidatorId),
    Sender(PublicKey),
    Proposer(ValidatorId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueShare {
    pub beneficiary: Beneficiary,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueDistribution {
    pub total: Amount,
    pub shares: Vec<RevenueShare>,
}

impl RevenueDistribution {
    pub fn amount_for(&self, beneficiary: &Beneficiary) -> Amount {
        self.shares
            .iter()
            .filter(|s| &s.beneficiary == beneficiary)
            .map(|s| s.amount)
            .sum()
    }

    pub fn sum(&self) -> Amount {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

/// Split `total`. `validator_stakes` are effective stakes; `pending_senders`
/// carry the amount each sender has pending on the shard and weight the
/// rebate. A pool with no recipients falls to the treasury.
pub fn split_revenue(
    total: Amount,
    config: &RevenueSplitConfig,
    validator_stakes: &[(ValidatorId, u128)],
    pending_senders: &[(PublicKey, Amount)],
    proposer: &ValidatorId,
) -> Result<RevenueDistribution, ConsensusError> {
    config.validate()?;
    let raw = total.raw();
    let mut shares = Vec::new();
    let mut allocated: u128 = 0;

    let validator_pool = apply_bps(raw, config.validators_bps);
    let stake_total: u128 = validator_stakes
        .iter()
        .fold(0u128, |acc, (_, s)| acc.saturating_add(*s));
    for (id, stake) in validator_stakes {
        let amount = pro_rata(validator_pool, *stake, stake_total);
        if amount > 0 {
            allocated += amount;
            shares.push(RevenueShare {
                beneficiary: Beneficiary::Validator(id.clone()),
                amount: Amount::new(amount),
            });
        }
    }

    let rebate_pool = apply_bps(raw, config.rebate_bps);
    let pending_total: u128 = pending_senders
        .iter()
        .fold(0u128, |acc, (_, a)| acc.saturating_add(a.raw()));
    for (sender, pending) in pending_senders {
        let amount = pro_rata(rebate_pool, pending.raw(), pending_total);
        if amount > 0 {
            allocated += amount;
            shares.push(RevenueShare {
                beneficiary: Beneficiary::Sender(*sender),
                amount: Amount::new(amount),
            });
        }
    }

    let proposer_amount = apply_bps(raw, config.proposer_bps);
    if proposer_amount > 0 {
        allocated += proposer_amount;
        shares.push(RevenueShare {
            beneficiary: Beneficiary::Proposer(proposer.clone()),
            amount: Amount::new(proposer_amount),
        });
    }

    // Treasury takes its own share plus whatever the other pools left over.
    shares.insert(
        0,
        RevenueShare {
            beneficiary: Beneficiary::Treasury,
            amount: Amount::new(raw.saturating_sub(allocated)),
        },
    );

    Ok(RevenueDistribution { total, shares })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_types::SignatureAlgorithm;

    fn sender(b: u8) -> PublicKey {
        PublicKey::new(SignatureAlgorithm::Ed25519, [b; 32])
    }

    #[test]
    fn default_split_of_round_bid() {
        let stakes = vec![("a".into(), 3_000u128), ("b".into(), 1_000)];
        let senders = vec![(sender(1), Amount::new(50)), (sender(2), Amount::new(50))];
        let dist = split_revenue(Amount::new(1_000), &RevenueSplitConfig::default(), &stakes, &senders, &"a".into()).unwrap();

        assert_eq!(dist.amount_for(&Beneficiary::Treasury), Amount::new(100));
        assert_eq!(dist.amount_for(&Beneficiary::Validator("a".into())), Amount::new(300));
        assert_eq!(dist.amount_for(&Beneficiary::Validator("b".into())), Amount::new(100));
        assert_eq!(dist.amount_for(&Beneficiary::Sender(sender(1))), Amount::new(150));
        assert_eq!(dist.amount_for(&Beneficiary::Proposer("a".into())), Amount::new(200));
        assert_eq!(dist.sum(), Amount::new(1_000));
    }

    #[test]
    fn dust_goes_to_treasury() {
        let stakes = vec![("a".into(), 1u128), ("b".into(), 1), ("c".into(), 1)];
        let senders = vec![(sender(1), Amount::new(1)), (sender(2), Amount::new(2))];
        let dist = split_revenue(Amount::new(101), &RevenueSplitConfig::default(), &stakes, &senders, &"b".into()).unwrap();
        assert_eq!(dist.sum(), Amount::new(101));
        assert!(dist.amount_for(&Beneficiary::Treasury) >= Amount::new(10));
    }

    #[test]
    fn no_senders_rebate_to_treasury() {
        let stakes = vec![("a".into(), 1u128)];
        let dist = split_revenue(Amount::new(1_000), &RevenueSplitConfig::default(), &stakes, &[], &"a".into()).unwrap();
        assert_eq!(dist.amount_for(&Beneficiary::Treasury), Amount::new(400));
        assert_eq!(dist.sum(), Amount::new(1_000));
    }

    #[test]
    fn every_share_recorded_individually() {
        let stakes = vec![("a".into(), 1u128), ("b".into(), 1)];
        let senders = vec![(sender(1), Amount::new(1))];
        let dist = split_revenue(Amount::new(1_000), &RevenueSplitConfig::default(), &stakes, &senders, &"a".into()).unwrap();
        // treasury, two validators, one sender, proposer
        assert_eq!(dist.shares.len(), 5);
        assert_eq!(dist.shares[0].beneficiary, Beneficiary::Treasury);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = RevenueSplitConfig {
            treasury_bps: 5_000,
            ..RevenueSplitConfig::default()
        };
        assert!(split_revenue(Amount::new(1), &config, &[], &[], &"a".into()).is_err());
    }
}
