//! Sealed-bid MEV sequencer auction for one (shard, slot).
//!
//! Committee members commit `H(bid ‖ nonce)`, then reveal `(bid, nonce)`.
//! A reveal counts only if it matches the bidder's commitment; anything else
//! (wrong phase, not eligible, no commitment, mismatch, second reveal) is
//! discarded without error. The highest counted bid wins, ties to the
//! earliest reveal.

use std::collections::{BTreeSet, HashMap};

use dualnet_crypto::hash_domain;
use dualnet_types::{Amount, ShardId, ValidatorId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const BID_DOMAIN: &[u8] = b"dualnet.auction.bid";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    Commit,
    Reveal,
    Closed,
}

/// Sealed commitment to `bid` under a secret nonce.
pub fn bid_commitment(bid: Amount, nonce: &[u8; 32]) -> [u8; 32] {
    let mut preimage = [0u8; 48];
    preimage[..16].copy_from_slice(&bid.raw().to_be_bytes());
    preimage[16..].copy_from_slice(nonce);
    hash_domain(BID_DOMAIN, &preimage)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RevealedBid {
    bidder: ValidatorId,
    bid: Amount,
    sequence: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub shard: ShardId,
    pub slot: u64,
    pub winner: ValidatorId,
    pub bid: Amount,
}

pub struct SequencerAuction {
    shard: ShardId,
    slot: u64,
    phase: AuctionPhase,
    eligible: BTreeSet<ValidatorId>,
    commitments: HashMap<ValidatorId, [u8; 32]>,
    reveals: Vec<RevealedBid>,
    next_sequence: u64,
}

impl SequencerAuction {
    pub fn new(shard: ShardId, slot: u64, eligible: impl IntoIterator<Item = ValidatorId>) -> Self {
        Self {
            shard,
            slot,
            phase: AuctionPhase::Commit,
            eligible: eligible.into_iter().collect(),
            commitments: HashMap::new(),
            reveals: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Returns whether the commitment was recorded.
    pub fn commit(&mut self, bidder: &ValidatorId, commitment: [u8; 32]) -> bool {
        if self.phase != AuctionPhase::Commit || !self.eligible.contains(bidder) {
            debug!(shard = self.shard, slot = self.slot, bidder = %bidder, "commitment discarded");
            return false;
        }
        if self.commitments.contains_key(bidder) {
            return false;
        }
        self.commitments.insert(bidder.clone(), commitment);
        true
    }

    /// Move from Commit to Reveal. No-op in any other phase.
    pub fn open_reveal(&mut self) {
        if self.phase == AuctionPhase::Commit {
            self.phase = AuctionPhase::Reveal;
        }
    }

    /// Returns whether the reveal counted.
    pub fn reveal(&mut self, bidder: &ValidatorId, bid: Amount, nonce: &[u8; 32]) -> bool {
        if self.phase != AuctionPhase::Reveal {
            return false;
        }
        let Some(commitment) = self.commitments.get(bidder) else {
            debug!(shard = self.shard, slot = self.slot, bidder = %bidder, "reveal without commitment discarded");
            return false;
        };
        if *commitment != bid_commitment(bid, nonce) {
            debug!(shard = self.shard, slot = self.slot, bidder = %bidder, "reveal mismatch discarded");
            return false;
        }
        if self.reveals.iter().any(|r| &r.bidder == bidder) {
            return false;
        }
        self.reveals.push(RevealedBid {
            bidder: bidder.clone(),
            bid,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        true
    }

    /// Close the auction and return the winner, if any valid reveal exists.
    /// Closing from Commit skips reveals entirely.
    pub fn close(&mut self) -> Option<AuctionOutcome> {
        if self.phase == AuctionPhase::Closed {
            return None;
        }
        self.phase = AuctionPhase::Closed;

        let best = self
            .reveals
            .iter()
            .max_by(|a, b| a.bid.cmp(&b.bid).then(b.sequence.cmp(&a.sequence)))?;
        info!(shard = self.shard, slot = self.slot, winner = %best.bidder, bid = %best.bid, "sequencer auction closed");
        Some(AuctionOutcome {
            shard: self.shard,
            slot: self.slot,
            winner: best.bidder.clone(),
            bid: best.bid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auction() -> SequencerAuction {
        SequencerAuction::new(0, 7, ["a", "b", "c"].map(ValidatorId::from))
    }

    fn sealed(a: &mut SequencerAuction, who: &str, bid: u128, nonce: u8) {
        assert!(a.commit(&who.into(), bid_commitment(Amount::new(bid), &[nonce; 32])));
    }

    #[test]
    fn highest_bid_wins() {
        let mut a = auction();
        sealed(&mut a, "a", 10, 1);
        sealed(&mut a, "b", 30, 2);
        a.open_reveal();
        assert!(a.reveal(&"a".into(), Amount::new(10), &[1; 32]));
        assert!(a.reveal(&"b".into(), Amount::new(30), &[2; 32]));
        let out = a.close().unwrap();
        assert_eq!(out.winner, "b".into());
        assert_eq!(out.bid, Amount::new(30));
    }

    #[test]
    fn mismatched_reveal_never_wins() {
        let mut a = auction();
        sealed(&mut a, "a", 10, 1);
        sealed(&mut a, "b", 5, 2);
        a.open_reveal();
        // b claims a higher bid than committed
        assert!(!a.reveal(&"b".into(), Amount::new(500), &[2; 32]));
        assert!(a.reveal(&"a".into(), Amount::new(10), &[1; 32]));
        assert_eq!(a.close().unwrap().winner, "a".into());
    }

    #[test]
    fn tie_goes_to_earliest_reveal() {
        let mut a = auction();
        sealed(&mut a, "a", 20, 1);
        sealed(&mut a, "c", 20, 3);
        a.open_reveal();
        assert!(a.reveal(&"c".into(), Amount::new(20), &[3; 32]));
        assert!(a.reveal(&"a".into(), Amount::new(20), &[1; 32]));
        assert_eq!(a.close().unwrap().winner, "c".into());
    }

    #[test]
    fn ineligible_and_out_of_phase_discarded() {
        let mut a = auction();
        assert!(!a.commit(&"mallory".into(), [0; 32]));
        sealed(&mut a, "a", 1, 1);
        assert!(!a.reveal(&"a".into(), Amount::new(1), &[1; 32]));
        a.open_reveal();
        assert!(!a.commit(&"b".into(), bid_commitment(Amount::new(9), &[9; 32])));
        assert!(!a.reveal(&"b".into(), Amount::new(9), &[9; 32]));
    }

    #[test]
    fn double_reveal_ignored() {
        let mut a = auction();
        sealed(&mut a, "a", 4, 1);
        a.open_reveal();
        assert!(a.reveal(&"a".into(), Amount::new(4), &[1; 32]));
        assert!(!a.reveal(&"a".into(), Amount::new(4), &[1; 32]));
    }

    #[test]
    fn no_reveals_no_winner() {
        let mut a = auction();
        sealed(&mut a, "a", 4, 1);
        a.open_reveal();
        assert!(a.close().is_none());
        assert_eq!(a.phase(), AuctionPhase::Closed);
        assert!(a.close().is_none());
    }
}
