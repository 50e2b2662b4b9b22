//! Merkle tree construction and node hashing for LMS.
//!
//! Nodes are addressed by 1-based index `r`: leaves occupy
//! `[2^h, 2^(h+1))`, internal nodes `[1, 2^h)`, and index 1 is the root
//! that becomes the public key. Slot 0 is unused so that the parent of
//! node `r` is `r / 2` with integer division.

use sha2::{Digest, Sha256};

use crate::lmots::LmotsKeyPair;
use crate::params::{LmsParameterSet, LMS_M_NODE_BYTES_MAX};
use crate::utils::u32_to_bytes;

/// Domain separator for leaf node hashes, `D_LEAF`.
const D_LEAF: [u8; 2] = [0x82, 0x82];

/// Domain separator for internal node hashes, `D_INTR`.
const D_INTR: [u8; 2] = [0x83, 0x83];

/// Computes the leaf node `T(r) = H(I || u32(r) || D_LEAF || K)` where `K`
/// is the OTS public key of leaf `q = r - 2^h`. Writes `m` bytes to `out`.
pub(crate) fn leaf_node(params: &LmsParameterSet, ots_public_key: &[u8], r: u32, out: &mut [u8]) {
    let m = params.lms.m;
    let mut hasher = Sha256::new();
    hasher.update(params.key_id);
    hasher.update(u32_to_bytes(r));
    hasher.update(D_LEAF);
    hasher.update(&ots_public_key[..params.ots.n]);
    out[..m].copy_from_slice(&hasher.finalize()[..m]);
}

/// Computes the internal node
/// `T(r) = H(I || u32(r) || D_INTR || T(2r) || T(2r+1))`.
/// Writes `m` bytes to `out`.
pub(crate) fn internal_node(
    params: &LmsParameterSet,
    left: &[u8],
    right: &[u8],
    r: u32,
    out: &mut [u8],
) {
    let m = params.lms.m;
    let mut hasher = Sha256::new();
    hasher.update(params.key_id);
    hasher.update(u32_to_bytes(r));
    hasher.update(D_INTR);
    hasher.update(&left[..m]);
    hasher.update(&right[..m]);
    out[..m].copy_from_slice(&hasher.finalize()[..m]);
}

/// The dense node array of a fully built tree: `2^(h+1)` slots of `m`
/// bytes each.
pub(crate) struct MerkleTree {
    nodes: Vec<u8>,
    m: usize,
    h: u32,
}

impl MerkleTree {
    /// Builds the whole tree from the leaf key pairs: first every leaf
    /// hash in ascending `q`, then the internal nodes from `2^h - 1` down
    /// to 1 so that a parent is only computed once both children exist.
    pub(crate) fn build(params: &LmsParameterSet, leaves: &[LmotsKeyPair]) -> Self {
        let m = params.lms.m;
        let leaf_count = params.lms.leaf_count() as usize;
        let mut nodes = vec![0u8; params.lms.node_count() * m];

        for (q, leaf) in leaves.iter().enumerate() {
            let r = (leaf_count + q) as u32;
            leaf_node(
                params,
                leaf.public.as_bytes(),
                r,
                &mut nodes[(leaf_count + q) * m..(leaf_count + q + 1) * m],
            );
        }

        let mut parent = [0u8; LMS_M_NODE_BYTES_MAX];
        for r in (1..leaf_count).rev() {
            internal_node(
                params,
                &nodes[(2 * r) * m..(2 * r + 1) * m],
                &nodes[(2 * r + 1) * m..(2 * r + 2) * m],
                r as u32,
                &mut parent,
            );
            nodes[r * m..(r + 1) * m].copy_from_slice(&parent[..m]);
        }

        Self {
            nodes,
            m,
            h: params.lms.h,
        }
    }

    /// The node value at 1-based index `r`.
    pub(crate) fn node(&self, r: usize) -> &[u8] {
        &self.nodes[r * self.m..(r + 1) * self.m]
    }

    /// The root `T(1)`, i.e. the public-key value.
    pub(crate) fn root(&self) -> &[u8] {
        self.node(1)
    }

    /// Writes the authentication path for leaf `q` into `path`: the `h`
    /// sibling nodes encountered climbing from `2^h + q` to the root,
    /// leaf-side first.
    pub(crate) fn authentication_path(&self, q: u32, path: &mut [u8]) {
        let m = self.m;
        let mut r = (1u32 << self.h) + q;
        for height in 0..self.h as usize {
            let sibling = r ^ 1;
            path[height * m..(height + 1) * m].copy_from_slice(self.node(sibling as usize));
            r >>= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LmsParameter, LmotsParameter};

    // A small 8-leaf geometry keeps the tests readable; node arithmetic
    // does not depend on the height.
    fn small_params() -> LmsParameterSet {
        LmsParameterSet {
            lms: LmsParameter {
                type_id: 0x0000_0005,
                m: 32,
                h: 3,
            },
            ots: LmotsParameter {
                type_id: 0x0000_0004,
                n: 32,
                w: 8,
                p: 34,
                ls: 0,
            },
            key_id: [0xa5; 16],
        }
    }

    fn small_leaves(params: &LmsParameterSet) -> Vec<LmotsKeyPair> {
        (0..params.lms.leaf_count())
            .map(|q| LmotsKeyPair::generate(params.ots, &params.key_id, q, b"merkle test seed"))
            .collect()
    }

    #[test]
    fn test_leaf_slots_hold_leaf_hashes() {
        let params = small_params();
        let leaves = small_leaves(&params);
        let tree = MerkleTree::build(&params, &leaves);

        let leaf_count = params.lms.leaf_count();
        let mut expected = [0u8; LMS_M_NODE_BYTES_MAX];
        for q in 0..leaf_count {
            let r = leaf_count + q;
            leaf_node(&params, leaves[q as usize].public.as_bytes(), r, &mut expected);
            assert_eq!(tree.node(r as usize), &expected[..32]);
        }
    }

    #[test]
    fn test_parents_hash_their_children() {
        let params = small_params();
        let tree = MerkleTree::build(&params, &small_leaves(&params));

        let mut expected = [0u8; LMS_M_NODE_BYTES_MAX];
        for r in 1..params.lms.leaf_count() as usize {
            internal_node(
                &params,
                tree.node(2 * r),
                tree.node(2 * r + 1),
                r as u32,
                &mut expected,
            );
            assert_eq!(tree.node(r), &expected[..32]);
        }
    }

    #[test]
    fn test_authentication_path_climbs_to_root() {
        let params = small_params();
        let tree = MerkleTree::build(&params, &small_leaves(&params));
        let m = params.lms.m;
        let h = params.lms.h;

        for q in 0..params.lms.leaf_count() {
            let mut path = vec![0u8; m * h as usize];
            tree.authentication_path(q, &mut path);

            let mut r = params.lms.leaf_count() + q;
            let mut node = [0u8; LMS_M_NODE_BYTES_MAX];
            node[..m].copy_from_slice(tree.node(r as usize));
            let mut out = [0u8; LMS_M_NODE_BYTES_MAX];
            for height in 0..h as usize {
                let sibling = &path[height * m..(height + 1) * m];
                if r & 1 == 1 {
                    internal_node(&params, sibling, &node[..m], r / 2, &mut out);
                } else {
                    internal_node(&params, &node[..m], sibling, r / 2, &mut out);
                }
                node = out;
                r /= 2;
            }
            assert_eq!(&node[..m], tree.root());
        }
    }
}
