use std::collections::{BTreeSet, HashMap};

use dualnet_consensus::{effective_stakes, select_committee, select_proposer, Validator};
use dualnet_types::{Amount, PublicKey, SignatureAlgorithm, ValidatorId};
use dualnet_vrf::SeedBeacon;
use proptest::prelude::*;

fn validators(stakes: &[u128]) -> Vec<Validator> {
    stakes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Validator::new(
                ValidatorId::new(format!("v{i:02}")),
                PublicKey::new(SignatureAlgorithm::Ed25519, [i as u8; 32]),
                Amount::new(*s),
            )
        })
        .collect()
}

fn seed(i: u32) -> [u8; 32] {
    let mut s = [0u8; 32];
    s[..4].copy_from_slice(&i.to_be_bytes());
    s
}

proptest! {
    #[test]
    fn effective_stake_never_exceeds_cap(
        stakes in prop::collection::vec(1u128..1_000_000_000, 1..20),
        cap_bps in 1u32..=10_000,
    ) {
        let vs = validators(&stakes);
        let total: u128 = stakes.iter().sum();
        let cap = total * u128::from(cap_bps) / 10_000;
        for (_, eff) in effective_stakes(&vs, cap_bps) {
            prop_assert!(eff <= cap);
        }
    }

    #[test]
    fn committee_distinct_and_sized(
        stakes in prop::collection::vec(1u128..1_000_000, 1..15),
        size in 1usize..8,
        s in any::<u32>(),
    ) {
        let vs = validators(&stakes);
        let committee = select_committee(&SeedBeacon::new(seed(s), 0), &vs, 2_500, size).unwrap();
        prop_assert_eq!(committee.len(), size.min(stakes.len()));
        let unique: BTreeSet<_> = committee.iter().collect();
        prop_assert_eq!(unique.len(), committee.len());
    }

    #[test]
    fn proposer_is_active_member(stakes in prop::collection::vec(1u128..1_000_000, 1..15), s in any::<u32>()) {
        let vs = validators(&stakes);
        let winner = select_proposer(&SeedBeacon::new(seed(s), 0), &vs, 2_500).unwrap();
        prop_assert!(vs.iter().any(|v| v.id == winner));
    }
}

#[test]
fn double_stake_roughly_double_seats() {
    let mut stakes = vec![2_000u128];
    stakes.extend(std::iter::repeat(1_000).take(18));
    let vs = validators(&stakes);

    let mut seats: HashMap<ValidatorId, u32> = HashMap::new();
    for round in 0..3_000 {
        let committee = select_committee(&SeedBeacon::new(seed(round), 0), &vs, 10_000, 2).unwrap();
        for id in committee {
            *seats.entry(id).or_default() += 1;
        }
    }

    let heavy = f64::from(seats.get(&ValidatorId::new("v00")).copied().unwrap_or(0));
    let light: f64 = (1..19)
        .map(|i| f64::from(seats.get(&ValidatorId::new(format!("v{i:02}"))).copied().unwrap_or(0)))
        .sum::<f64>()
        / 18.0;
    let ratio = heavy / light;
    assert!((1.4..2.6).contains(&ratio), "ratio {ratio}");
}

#[test]
fn cap_limits_selection_advantage() {
    // A validator with 10x stake capped at 10% behaves like its peers.
    let mut stakes = vec![10_000u128];
    stakes.extend(std::iter::repeat(1_000).take(9));
    let vs = validators(&stakes);
    let stakes = effective_stakes(&vs, 1_000);
    assert_eq!(stakes[0].1, 1_900);
    assert!(stakes[1..].iter().all(|(_, s)| *s == 1_000));
}
