//! Block validation shared by both networks.
//!
//! [`BlockValidator::authenticate`] runs first and ties the block to its
//! proposer's registered key. [`BlockValidator::validate`] then checks, in
//! order: every parent is known (or is the genesis / shard-root sentinel),
//! the recomputed Merkle root matches the header, the recomputed hash
//! matches, then every transaction carries a valid sender signature and
//! passes compliance screening. The first failure rejects the whole block.

use dualnet_compliance::TransactionScreener;
use dualnet_crypto::verify_signature;
use dualnet_types::{BlockHash, PublicKey};
use tracing::warn;

use crate::block::{compute_merkle_root, SealedBlock};
use crate::BlockRejection;

#[derive(Clone)]
pub struct BlockValidator {
    screener: TransactionScreener,
}

impl BlockValidator {
    pub fn new(screener: TransactionScreener) -> Self {
        Self { screener }
    }

    pub fn screener(&self) -> &TransactionScreener {
        &self.screener
    }

    /// Verify the proposer signature over the header hash. `proposer_key` is
    /// the key registered for `block.proposer()`, if any.
    pub fn authenticate<B: SealedBlock>(&self, block: &B, proposer_key: Option<&PublicKey>) -> Result<(), BlockRejection> {
        let result = match (proposer_key, block.signature()) {
            (None, _) => Err(BlockRejection::UnknownProposer(block.proposer().clone())),
            (Some(_), None) => Err(BlockRejection::MissingSignature),
            (Some(key), Some(signature)) if !verify_signature(block.hash().as_bytes(), signature, key) => {
                Err(BlockRejection::BadSignature)
            }
            (Some(_), Some(_)) => Ok(()),
        };
        if let Err(rejection) = &result {
            warn!(block = %block.hash(), proposer = %block.proposer(), %rejection, "unauthenticated block dropped");
        }
        result
    }

    pub fn validate<B: SealedBlock>(
        &self,
        block: &B,
        parent_known: impl Fn(&BlockHash) -> bool,
    ) -> Result<(), BlockRejection> {
        let result = self.check(block, parent_known);
        if let Err(rejection) = &result {
            warn!(block = %block.hash(), proposer = %block.proposer(), %rejection, "block rejected");
        }
        result
    }

    fn check<B: SealedBlock>(
        &self,
        block: &B,
        parent_known: impl Fn(&BlockHash) -> bool,
    ) -> Result<(), BlockRejection> {
        if let Some(missing) = block.parents().iter().find(|p| !parent_known(*p)) {
            return Err(BlockRejection::UnknownParent(*missing));
        }

        let computed = compute_merkle_root(block.transactions());
        if &computed != block.merkle_root() {
            return Err(BlockRejection::MerkleMismatch {
                header: hex::encode(block.merkle_root()),
                computed: hex::encode(computed),
            });
        }

        let computed = block.compute_hash();
        if computed != block.hash() {
            return Err(BlockRejection::HashMismatch {
                header: block.hash(),
                computed,
            });
        }

        for tx in block.transactions() {
            if !tx.verify_signature() {
                return Err(BlockRejection::InvalidTransactionSignature(tx.hash));
            }
            self.screener
                .screen(tx)
                .map_err(|violation| BlockRejection::Compliance {
                    tx_hash: tx.hash,
                    violation,
                })?;
        }
        Ok(())
    }
}
