//! Binary Merkle root over 32-byte leaves.
//!
//! Leaves and interior nodes are hashed under different prefixes so a leaf can
//! never be reinterpreted as an interior node. An odd node at any level is
//! paired with itself.

use crate::{blake2b_256, blake2b_256_multi};

const LEAF_PREFIX: [u8; 1] = [0x00];
const NODE_PREFIX: [u8; 1] = [0x01];

/// Preimage of the root of an empty list.
pub const EMPTY_MERKLE_ROOT_TAG: &[u8] = b"dualnet.merkle.empty";

/// Compute the Merkle root of an ordered list of leaves.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return blake2b_256(EMPTY_MERKLE_ROOT_TAG);
    }

    let mut level: Vec<[u8; 32]> = leaves
        .iter()
        .map(|leaf| blake2b_256_multi(&[&LEAF_PREFIX, leaf]))
        .collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                blake2b_256_multi(&[&NODE_PREFIX, &pair[0], right])
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> [u8; 32] {
        [n; 32]
    }

    #[test]
    fn root_is_deterministic() {
        let leaves = vec![leaf(1), leaf(2), leaf(3)];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn order_matters() {
        assert_ne!(
            merkle_root(&[leaf(1), leaf(2)]),
            merkle_root(&[leaf(2), leaf(1)])
        );
    }

    #[test]
    fn single_leaf_is_not_the_leaf_itself() {
        assert_ne!(merkle_root(&[leaf(9)]), leaf(9));
    }

    #[test]
    fn empty_root_is_fixed() {
        assert_eq!(merkle_root(&[]), blake2b_256(EMPTY_MERKLE_ROOT_TAG));
    }

    #[test]
    fn changing_any_leaf_changes_root() {
        let base: Vec<[u8; 32]> = (0..7).map(leaf).collect();
        let root = merkle_root(&base);
        for i in 0..base.len() {
            let mut altered = base.clone();
            altered[i][0] ^= 0xFF;
            assert_ne!(merkle_root(&altered), root, "leaf {i}");
        }
    }

    #[test]
    fn leaf_and_node_domains_are_separated() {
        // A two-leaf tree's root must differ from a one-leaf tree whose leaf
        // equals the concatenated interior preimage.
        let two = merkle_root(&[leaf(1), leaf(2)]);
        let one = merkle_root(&[two]);
        assert_ne!(two, one);
    }
}
