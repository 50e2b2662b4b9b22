//! # The LMS stateful hash-based signature scheme
//!
//! This module provides the public engine: key generation, the stateful
//! signer, the verifier, and the byte-exact public-key import/export of
//! RFC 8554 section 5.
//!
//! An LMS private key is a vector of LM-OTS leaf keys under a Merkle
//! tree; the public key is the tree root `T(1)`. A signature binds a
//! message to exactly one leaf `q` through its one-time signature plus
//! the `h` sibling hashes from that leaf up to the root.
//!
//! ## Statefulness
//!
//! LMS is a *stateful* scheme: the next-leaf counter is part of the
//! private key, and reusing a leaf forfeits all security — two signatures
//! from the same leaf let an observer forge further ones. [`sign`]
//! advances the counter before a single signature byte is produced, and a
//! failed sign still consumes its leaf; rolling the counter back can
//! never be made crash-safe and is therefore not offered.
//!
//! Callers that persist keys carry the matching obligation: the advanced
//! counter must be durably stored (flushed, power-loss atomic) *before*
//! the signature is released to any observer, a private state whose
//! counter durability is unknown must not be loaded (skipping a safety
//! margin of leaves is the safe recovery), and a private state must never
//! be copied across machines.
//!
//! [`sign`]: LmsPrivateKey::sign

use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::lmots::{self, LmotsKeyPair, LmotsParameters};
use crate::merkle::{self, MerkleTree};
use crate::params::{
    LmsAlgorithmType, LmsParameterSet, LmotsAlgorithmType, I_KEY_ID_LEN, LMS_M_NODE_BYTES_MAX,
    PUBLIC_KEY_I_KEY_ID_OFFSET, PUBLIC_KEY_OTSTYPE_OFFSET, PUBLIC_KEY_ROOT_NODE_OFFSET,
    PUBLIC_KEY_TYPE_OFFSET, SIG_OTS_SIG_OFFSET, SIG_Q_LEAF_ID_OFFSET,
};
use crate::utils::{get_u32_at, set_u32_at};

/// An LMS public key: the parameter identifiers, the key identifier `I`,
/// and the Merkle root `T(1)`.
///
/// Immutable once constructed and safe to share across concurrent
/// verifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmsPublicKey {
    params: LmsParameterSet,
    t1: [u8; LMS_M_NODE_BYTES_MAX],
}

/// An LMS private key: one LM-OTS key pair per leaf plus the next-leaf
/// counter `q_next`.
///
/// The leaf array and counter are zeroized when the key is dropped.
/// Signing requires exclusive ownership (`&mut self`), which rules out
/// concurrent use of one private state at the type level.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LmsPrivateKey {
    #[zeroize(skip)]
    params: LmsParameterSet,
    leaves: Vec<LmotsKeyPair>,
    pub(crate) q_next: u32,
}

impl LmsPrivateKey {
    /// Generates a fresh private key.
    ///
    /// The 16-byte key identifier `I` is drawn from `rng`; the leaf keys
    /// are expanded deterministically from `(I, q, seed)` per RFC 8554
    /// appendix A. Because `I` comes from the rng and not from the seed,
    /// two keys generated from the same seed are still distinct.
    ///
    /// Leaf expansion is the expensive step (`2^h` one-time key pairs);
    /// it is spread across the rayon thread pool.
    ///
    /// # Arguments
    ///
    /// * `typ` - The LMS parameter set to generate for.
    /// * `otstype` - The LM-OTS parameter set of the leaves.
    /// * `rng` - Cryptographic randomness source for `I`.
    /// * `seed` - Secret seed the leaf private keys are expanded from.
    pub fn generate<R: CryptoRng + RngCore>(
        typ: LmsAlgorithmType,
        otstype: LmotsAlgorithmType,
        rng: &mut R,
        seed: &[u8],
    ) -> Result<Self> {
        let mut key_id = [0u8; I_KEY_ID_LEN];
        rng.fill_bytes(&mut key_id);
        Self::generate_with_parameter_set(LmsParameterSet::new(typ, otstype, key_id), seed)
    }

    pub(crate) fn generate_with_parameter_set(params: LmsParameterSet, seed: &[u8]) -> Result<Self> {
        let leaf_count = params.lms.leaf_count();
        let mut leaves: Vec<LmotsKeyPair> = Vec::new();
        leaves
            .try_reserve_exact(leaf_count as usize)
            .map_err(|_| Error::AllocFailed)?;
        leaves.par_extend(
            (0..leaf_count)
                .into_par_iter()
                .map(|q| LmotsKeyPair::generate(params.ots, &params.key_id, q, seed)),
        );

        Ok(Self {
            params,
            leaves,
            q_next: 0,
        })
    }

    /// Derives the public key by building the full Merkle tree and taking
    /// its root.
    pub fn public_key(&self) -> LmsPublicKey {
        let tree = MerkleTree::build(&self.params, &self.leaves);
        let mut t1 = [0u8; LMS_M_NODE_BYTES_MAX];
        t1[..self.params.lms.m].copy_from_slice(tree.root());
        LmsPublicKey {
            params: self.params,
            t1,
        }
    }

    /// Signs `message` with the next unused leaf and writes the wire
    /// signature into `signature`, returning the number of bytes written.
    ///
    /// The leaf counter is advanced before any signature bytes exist, and
    /// it stays advanced even if a later step fails: a leaf that signing
    /// has touched is consumed for good. Callers persisting key state
    /// must durably store the advanced counter before releasing the
    /// signature (see the module documentation).
    ///
    /// # Errors
    ///
    /// * [`Error::BufferTooSmall`] if `signature` cannot hold
    ///   [`signature_len`](Self::signature_len) bytes; no leaf is
    ///   consumed.
    /// * [`Error::OutOfPrivateKeys`] once all `2^h` leaves are used. The
    ///   key is permanently exhausted; the state is not modified.
    pub fn sign<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        message: &[u8],
        signature: &mut [u8],
    ) -> Result<usize> {
        let params = self.params;
        let sig_len = params.signature_len();
        if signature.len() < sig_len {
            return Err(Error::BufferTooSmall);
        }
        if self.q_next >= params.lms.leaf_count() {
            return Err(Error::OutOfPrivateKeys);
        }

        let q = self.q_next;
        // Leaf q is consumed from this point on, whatever happens below.
        self.q_next = q + 1;

        set_u32_at(signature, q, SIG_Q_LEAF_ID_OFFSET);
        self.leaves[q as usize].private.sign(
            rng,
            message,
            &mut signature[SIG_OTS_SIG_OFFSET..params.sig_type_offset()],
        )?;
        set_u32_at(signature, params.lms.type_id, params.sig_type_offset());

        let tree = MerkleTree::build(&params, &self.leaves);
        tree.authentication_path(q, &mut signature[params.sig_path_offset()..sig_len]);

        Ok(sig_len)
    }

    /// Serialized length of the signatures this key produces.
    pub fn signature_len(&self) -> usize {
        self.params.signature_len()
    }

    /// Number of one-time leaf keys not yet consumed. Zero means the key
    /// is exhausted.
    pub fn leaves_remaining(&self) -> u32 {
        self.params.lms.leaf_count() - self.q_next
    }
}

impl LmsPublicKey {
    /// Parses a public key from its wire encoding.
    ///
    /// The buffer must hold at least the `4 + 4 + 16 + m` encoded bytes;
    /// unknown type identifiers and short buffers are rejected with
    /// [`Error::BadInputData`].
    pub fn import(key: &[u8]) -> Result<Self> {
        if key.len() < PUBLIC_KEY_ROOT_NODE_OFFSET {
            return Err(Error::BadInputData);
        }
        let typ = LmsAlgorithmType::from_type_id(get_u32_at(key, PUBLIC_KEY_TYPE_OFFSET))?;
        let otstype = LmotsAlgorithmType::from_type_id(get_u32_at(key, PUBLIC_KEY_OTSTYPE_OFFSET))?;

        let mut key_id = [0u8; I_KEY_ID_LEN];
        key_id.copy_from_slice(
            &key[PUBLIC_KEY_I_KEY_ID_OFFSET..PUBLIC_KEY_I_KEY_ID_OFFSET + I_KEY_ID_LEN],
        );
        let params = LmsParameterSet::new(typ, otstype, key_id);
        if key.len() < params.public_key_len() {
            return Err(Error::BadInputData);
        }

        let mut t1 = [0u8; LMS_M_NODE_BYTES_MAX];
        t1[..params.lms.m]
            .copy_from_slice(&key[PUBLIC_KEY_ROOT_NODE_OFFSET..params.public_key_len()]);
        Ok(Self { params, t1 })
    }

    /// Writes the wire encoding into `key` and returns the number of
    /// bytes written, or [`Error::BufferTooSmall`] if it does not fit.
    pub fn export(&self, key: &mut [u8]) -> Result<usize> {
        let key_len = self.params.public_key_len();
        if key.len() < key_len {
            return Err(Error::BufferTooSmall);
        }
        set_u32_at(key, self.params.lms.type_id, PUBLIC_KEY_TYPE_OFFSET);
        set_u32_at(key, self.params.ots.type_id, PUBLIC_KEY_OTSTYPE_OFFSET);
        key[PUBLIC_KEY_I_KEY_ID_OFFSET..PUBLIC_KEY_I_KEY_ID_OFFSET + I_KEY_ID_LEN]
            .copy_from_slice(&self.params.key_id);
        key[PUBLIC_KEY_ROOT_NODE_OFFSET..key_len]
            .copy_from_slice(&self.t1[..self.params.lms.m]);
        Ok(key_len)
    }

    /// Serialized length of this public key.
    pub fn public_key_len(&self) -> usize {
        self.params.public_key_len()
    }

    /// Serialized length of the signatures this key verifies.
    pub fn signature_len(&self) -> usize {
        self.params.signature_len()
    }

    /// Verifies `signature` over `message`.
    ///
    /// The signature length, the embedded type tags, and the leaf index
    /// range are checked first; then the candidate leaf public key is
    /// recovered from the one-time signature, hashed into a candidate
    /// leaf node, and climbed along the authentication path. The
    /// recomputed root is compared to the stored `T(1)` in constant time.
    ///
    /// Any inconsistency yields the same [`Error::VerifyFailed`]; which
    /// sub-check rejected the signature is not observable.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let params = &self.params;
        let m = params.lms.m;

        if signature.len() != params.signature_len() {
            return Err(Error::VerifyFailed);
        }
        // The OTS signature field leads with its own type tag.
        if get_u32_at(signature, SIG_OTS_SIG_OFFSET) != params.ots.type_id {
            return Err(Error::VerifyFailed);
        }
        if get_u32_at(signature, params.sig_type_offset()) != params.lms.type_id {
            return Err(Error::VerifyFailed);
        }
        let q = get_u32_at(signature, SIG_Q_LEAF_ID_OFFSET);
        if q >= params.lms.leaf_count() {
            return Err(Error::VerifyFailed);
        }

        let ots_params = LmotsParameters::with_parameter(params.ots, params.key_id, q);
        let candidate = lmots::recover_public_key_candidate(
            &ots_params,
            message,
            &signature[SIG_OTS_SIG_OFFSET..params.sig_type_offset()],
        )?;

        let mut r = params.lms.leaf_count() + q;
        let mut node = [0u8; LMS_M_NODE_BYTES_MAX];
        merkle::leaf_node(params, &candidate[..params.ots.n], r, &mut node);

        let path = &signature[params.sig_path_offset()..];
        let mut parent = [0u8; LMS_M_NODE_BYTES_MAX];
        for height in 0..params.lms.h as usize {
            let sibling = &path[height * m..(height + 1) * m];
            // Left/right ordering is decided by the parity of the current
            // node index, not of q.
            if r & 1 == 1 {
                merkle::internal_node(params, sibling, &node[..m], r / 2, &mut parent);
            } else {
                merkle::internal_node(params, &node[..m], sibling, r / 2, &mut parent);
            }
            node = parent;
            r /= 2;
        }

        if bool::from(node[..m].ct_eq(&self.t1[..m])) {
            Ok(())
        } else {
            Err(Error::VerifyFailed)
        }
    }
}
