//! Single-chain blocks and the shared block interface.

use dualnet_crypto::{merkle_root, CanonicalEncoder, CryptoError, Signer};
use dualnet_transactions::Transaction;
use dualnet_types::{Amount, BlockHash, Signature, Timestamp, ValidatorId};
use serde::{Deserialize, Serialize};

const BLOCK_DOMAIN: &[u8] = b"dualnet.block.v1";

/// What block validation needs from either block kind.
pub trait SealedBlock {
    fn hash(&self) -> BlockHash;
    fn parents(&self) -> &[BlockHash];
    fn proposer(&self) -> &ValidatorId;
    fn merkle_root(&self) -> &[u8; 32];
    fn transactions(&self) -> &[Transaction];
    /// Proposer's signature over the header hash.
    fn signature(&self) -> Option<&Signature>;
    /// Hash recomputed from content, using the recomputed Merkle root.
    fn compute_hash(&self) -> BlockHash;
}

/// Merkle root over recomputed transaction hashes, never the stored ones.
pub fn compute_merkle_root(transactions: &[Transaction]) -> [u8; 32] {
    let leaves: Vec<[u8; 32]> = transactions
        .iter()
        .map(|tx| *tx.compute_hash().as_bytes())
        .collect();
    merkle_root(&leaves)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: BlockHash,
    pub parent: BlockHash,
    pub height: u64,
    pub proposer: ValidatorId,
    pub timestamp: Timestamp,
    pub reward: Amount,
    pub merkle_root: [u8; 32],
    pub transactions: Vec<Transaction>,
    /// Not part of the hashed content.
    pub signature: Option<Signature>,
}

impl Block {
    /// Build a block and seal its Merkle root and hash.
    pub fn new(
        parent: BlockHash,
        height: u64,
        proposer: ValidatorId,
        timestamp: Timestamp,
        reward: Amount,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut block = Self {
            hash: BlockHash::ZERO,
            parent,
            height,
            proposer,
            timestamp,
            reward,
            merkle_root: compute_merkle_root(&transactions),
            transactions,
            signature: None,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Sign the sealed hash with the proposer's key.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), CryptoError> {
        self.signature = Some(signer.sign(self.hash.as_bytes())?);
        Ok(())
    }

    pub fn is_genesis_child(&self) -> bool {
        self.parent.is_zero()
    }
}

impl SealedBlock for Block {
    fn hash(&self) -> BlockHash {
        self.hash
    }

    fn parents(&self) -> &[BlockHash] {
        std::slice::from_ref(&self.parent)
    }

    fn proposer(&self) -> &ValidatorId {
        &self.proposer
    }

    fn merkle_root(&self) -> &[u8; 32] {
        &self.merkle_root
    }

    fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn compute_hash(&self) -> BlockHash {
        let mut enc = CanonicalEncoder::new(BLOCK_DOMAIN);
        enc.fixed(self.parent.as_bytes())
            .u64(self.height)
            .str(self.proposer.as_str())
            .u64(self.timestamp.as_secs())
            .u128(self.reward.raw())
            .fixed(&compute_merkle_root(&self.transactions))
            .u64(self.transactions.len() as u64);
        BlockHash::new(enc.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_transactions::TransactionBuilder;
    use dualnet_types::{PublicKey, SignatureAlgorithm};

    fn tx(nonce: u64) -> Transaction {
        TransactionBuilder::new(
            PublicKey::new(SignatureAlgorithm::Ed25519, [1; 32]),
            PublicKey::new(SignatureAlgorithm::Ed25519, [2; 32]),
            Amount::new(10),
        )
        .nonce(nonce)
        .build()
    }

    fn block(txs: Vec<Transaction>) -> Block {
        Block::new(BlockHash::ZERO, 1, "alice".into(), Timestamp::new(10), Amount::new(100), txs)
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(block(vec![tx(1), tx(2)]).hash, block(vec![tx(1), tx(2)]).hash);
    }

    #[test]
    fn order_matters() {
        assert_ne!(block(vec![tx(1), tx(2)]).hash, block(vec![tx(2), tx(1)]).hash);
    }

    #[test]
    fn mutating_transaction_changes_block_hash() {
        let original = block(vec![tx(1), tx(2)]);
        let mut tampered = original.clone();
        tampered.transactions[1].amount = Amount::new(11);
        assert_ne!(tampered.compute_hash(), original.hash);
        assert_ne!(compute_merkle_root(&tampered.transactions), tampered.merkle_root);
    }

    #[test]
    fn stored_tx_hash_is_ignored_for_merkle() {
        let original = block(vec![tx(1)]);
        let mut forged = original.clone();
        forged.transactions[0].hash = dualnet_types::TxHash::new([9; 32]);
        assert_eq!(compute_merkle_root(&forged.transactions), original.merkle_root);
    }

    #[test]
    fn signature_is_outside_the_hash() {
        let signer = dualnet_crypto::LocalSigner::from_seed(dualnet_types::SignatureAlgorithm::Ed25519, &[4; 32]);
        let mut signed = block(vec![tx(1)]);
        let unsigned_hash = signed.hash;
        signed.sign(&signer).unwrap();
        assert!(signed.signature.is_some());
        assert_eq!(signed.compute_hash(), unsigned_hash);
    }

    #[test]
    fn empty_block_has_fixed_root() {
        assert_eq!(block(vec![]).merkle_root, merkle_root(&[]));
    }
}
