//! Binary Merkle tree over canonical message digests: bottom-up,
//! odd nodes at a level duplicated rather than promoted (the "same-hash"
//! convention), hashed with whichever [`DigestAlgo`] the destination chain
//! expects so the root matches what the contract re-derives.

use relayer_types::{digest_bytes, DigestAlgo};

/// A built tree: every level from the leaves up to the single root,
/// `levels[0]` being the leaves and `levels.last()` the root (a
/// single-element level). Kept in full (not just the root) so
/// [`MerkleTree::proof`] never recomputes.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    algo: DigestAlgo,
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Builds a tree over `leaves` in the order given — callers are
    /// responsible for sorting by `message_id` first ("leaves
    /// sorted by message_id"), since leaf order defines leaf index and the
    /// Store's `batch_messages.leaf_index` must agree with it.
    ///
    /// # Panics
    /// Panics if `leaves` is empty; an empty batch is never sealed.
    pub fn new(leaves: Vec<[u8; 32]>, algo: DigestAlgo) -> Self {
        assert!(!leaves.is_empty(), "cannot build a Merkle tree over zero leaves");
        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let prev = levels.last().unwrap();
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            let mut i = 0;
            while i < prev.len() {
                let left = prev[i];
                let right = if i + 1 < prev.len() { prev[i + 1] } else { left };
                next.push(Self::hash_pair(&left, &right, algo));
                i += 2;
            }
            levels.push(next);
        }
        MerkleTree { algo, levels }
    }

    fn hash_pair(left: &[u8; 32], right: &[u8; 32], algo: DigestAlgo) -> [u8; 32] {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(left);
        buf.extend_from_slice(right);
        digest_bytes(&buf, algo)
    }

    pub fn root(&self) -> [u8; 32] {
        self.levels.last().unwrap()[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Sibling hashes from `leaf_index` up to (not including) the root, one
    /// per level, in bottom-to-top order.
    pub fn proof(&self, leaf_index: usize) -> Vec<[u8; 32]> {
        assert!(leaf_index < self.leaf_count(), "leaf index out of range");
        let mut proof = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 {
                if idx + 1 < level.len() { idx + 1 } else { idx }
            } else {
                idx - 1
            };
            proof.push(level[sibling_idx]);
            idx /= 2;
        }
        proof
    }
}

/// Recomputes the root from a leaf, its proof and its original index —
/// the same walk a destination contract performs to verify inclusion
/// before honoring a batch-unlock call.
pub fn verify(leaf: [u8; 32], proof: &[[u8; 32]], mut leaf_index: usize, root: [u8; 32], algo: DigestAlgo) -> bool {
    let mut current = leaf;
    for sibling in proof {
        current = if leaf_index % 2 == 0 {
            MerkleTree::hash_pair(&current, sibling, algo)
        } else {
            MerkleTree::hash_pair(sibling, &current, algo)
        };
        leaf_index /= 2;
    }
    current == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> [u8; 32] {
        let mut l = [0u8; 32];
        l[31] = n;
        l
    }

    fn leaves(n: usize) -> Vec<[u8; 32]> {
        (0..n as u8).map(leaf).collect()
    }

    #[test]
    fn two_leaves_root_is_hash_of_the_pair() {
        let tree = MerkleTree::new(leaves(2), DigestAlgo::Keccak256);
        let expected = MerkleTree::hash_pair(&leaf(0), &leaf(1), DigestAlgo::Keccak256);
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn odd_leaf_count_duplicates_the_last_node() {
        // 3 leaves: level1 = [h(0,1), h(2,2)], root = h(level1[0], level1[1]).
        let tree = MerkleTree::new(leaves(3), DigestAlgo::Keccak256);
        let h01 = MerkleTree::hash_pair(&leaf(0), &leaf(1), DigestAlgo::Keccak256);
        let h22 = MerkleTree::hash_pair(&leaf(2), &leaf(2), DigestAlgo::Keccak256);
        let expected = MerkleTree::hash_pair(&h01, &h22, DigestAlgo::Keccak256);
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn five_and_eight_leaf_trees_verify_every_proof() {
        for n in [5usize, 8] {
            let ls = leaves(n);
            let tree = MerkleTree::new(ls.clone(), DigestAlgo::Sha256);
            for (i, l) in ls.iter().enumerate() {
                let proof = tree.proof(i);
                assert!(verify(*l, &proof, i, tree.root(), DigestAlgo::Sha256), "leaf {i} failed to verify");
            }
        }
    }

    #[test]
    fn single_leaf_tree_is_its_own_root() {
        let tree = MerkleTree::new(leaves(1), DigestAlgo::Keccak256);
        assert_eq!(tree.root(), leaf(0));
        assert!(tree.proof(0).is_empty());
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let ls = leaves(5);
        let tree = MerkleTree::new(ls.clone(), DigestAlgo::Keccak256);
        let proof = tree.proof(2);
        assert!(!verify(leaf(9), &proof, 2, tree.root(), DigestAlgo::Keccak256));
    }
}
