//! Stake-capped, VRF-weighted committee and proposer selection.
//!
//! Effective stake is `min(bonded, cap × total) × performance`. Every VRF
//! draw goes through a [`VrfProvider`] keyed by a context that names the draw
//! and the validator, so any node holding the same provider (for public
//! selection, a `SeedBeacon` on the epoch seed) reproduces the result.

use std::collections::BTreeSet;

use dualnet_types::ValidatorId;
use dualnet_vrf::{normalized_score, score_u64, VrfProvider};
use tracing::debug;

use crate::math::{apply_bps, wide_mul};
use crate::{ConsensusError, Validator};

const TICKET_CONTEXT: &[u8] = b"ticket";
const EXTRA_CONTEXT: &[u8] = b"extra";
const FILL_CONTEXT: &[u8] = b"fill";
const PROPOSER_CONTEXT: &[u8] = b"proposer";

/// Effective stake for each active validator, in input order.
pub fn effective_stakes(validators: &[Validator], cap_bps: u32) -> Vec<(ValidatorId, u128)> {
    let active: Vec<&Validator> = validators.iter().filter(|v| v.active).collect();
    let total: u128 = active
        .iter()
        .fold(0u128, |acc, v| acc.saturating_add(v.bonded_stake().raw()));
    let cap = apply_bps(total, cap_bps);

    active
        .into_iter()
        .map(|v| {
            let capped = v.bonded_stake().raw().min(cap);
            (v.id.clone(), apply_bps(capped, v.performance_bps))
        })
        .collect()
}

fn context(kind: &[u8], id: &ValidatorId, index: u32) -> Vec<u8> {
    let mut ctx = Vec::with_capacity(kind.len() + id.as_str().len() + 5);
    ctx.extend_from_slice(kind);
    ctx.push(b':');
    ctx.extend_from_slice(id.as_str().as_bytes());
    ctx.extend_from_slice(&index.to_be_bytes());
    ctx
}

/// Guaranteed seats and the fractional remainder `(rem / denom)` of
/// `eff / total × size`.
fn seat_share(eff: u128, total: u128, size: u128) -> (u128, u128, u128) {
    let (mut e, mut t) = (eff, total);
    while e.checked_mul(size).is_none() {
        e >>= 1;
        t >>= 1;
    }
    let product = e * size;
    (product / t, product % t, t)
}

/// Select `committee_size` distinct validators.
///
/// Each validator receives `floor(eff / total × size)` guaranteed tickets
/// plus one extra ticket when its VRF score falls below the fractional
/// remainder. All tickets are ranked by VRF score and the lowest `size` are
/// taken, then deduplicated. Seats left empty are filled from the remaining
/// validators ranked by their fill draw.
pub fn select_committee(
    vrf: &dyn VrfProvider,
    validators: &[Validator],
    cap_bps: u32,
    committee_size: usize,
) -> Result<Vec<ValidatorId>, ConsensusError> {
    let stakes = effective_stakes(validators, cap_bps);
    if stakes.is_empty() {
        return Err(ConsensusError::NoActiveValidators);
    }
    let size = committee_size.min(stakes.len());
    if size == 0 {
        return Ok(Vec::new());
    }

    let total: u128 = stakes.iter().fold(0u128, |acc, (_, s)| acc.saturating_add(*s));
    let mut tickets: Vec<([u8; 32], &ValidatorId)> = Vec::new();
    if total > 0 {
        for (id, eff) in &stakes {
            let (guaranteed, rem, denom) = seat_share(*eff, total, size as u128);
            let mut count = guaranteed as u32;
            if rem > 0 {
                let draw = vrf.get_randomness(&context(EXTRA_CONTEXT, id, 0))?;
                if normalized_score(&draw.value) < rem as f64 / denom as f64 {
                    count += 1;
                }
            }
            for index in 0..count {
                let draw = vrf.get_randomness(&context(TICKET_CONTEXT, id, index))?;
                tickets.push((draw.value, id));
            }
        }
    }
    tickets.sort();

    let mut chosen: BTreeSet<&ValidatorId> = BTreeSet::new();
    let mut committee = Vec::with_capacity(size);
    for (_, id) in tickets.into_iter().take(size) {
        if chosen.insert(id) {
            committee.push(id.clone());
        }
    }

    if committee.len() < size {
        let mut rest = Vec::new();
        for (id, _) in stakes.iter().filter(|(id, _)| !chosen.contains(id)) {
            let draw = vrf.get_randomness(&context(FILL_CONTEXT, id, 0))?;
            rest.push((draw.value, id));
        }
        rest.sort();
        let missing = size - committee.len();
        committee.extend(rest.into_iter().take(missing).map(|(_, id)| id.clone()));
    }

    debug!(size = committee.len(), provider = vrf.name(), "committee selected");
    Ok(committee)
}

/// Highest `score × effective stake` wins; equal weights go to the first id
/// in lexicographic order.
pub fn select_proposer(
    vrf: &dyn VrfProvider,
    validators: &[Validator],
    cap_bps: u32,
) -> Result<ValidatorId, ConsensusError> {
    let mut stakes = effective_stakes(validators, cap_bps);
    stakes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut best: Option<((u128, u128), ValidatorId)> = None;
    for (id, eff) in stakes {
        let draw = vrf.get_randomness(&context(PROPOSER_CONTEXT, &id, 0))?;
        let weight = wide_mul(score_u64(&draw.value), eff);
        let better = match &best {
            None => true,
            Some((w, _)) => weight > *w,
        };
        if better {
            best = Some((weight, id));
        }
    }
    best.map(|(_, id)| id).ok_or(ConsensusError::NoActiveValidators)
}
