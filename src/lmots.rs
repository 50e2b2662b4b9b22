//! # Leighton-Micali One-Time Signatures (LM-OTS)
//!
//! This module implements the LM-OTS scheme of RFC 8554 section 4, the
//! one-time primitive consumed by the LMS Merkle tree: every tree leaf is
//! the hash of one LM-OTS public key, and every LMS signature embeds one
//! LM-OTS signature.
//!
//! Leaf private keys are expanded pseudo-randomly from a seed as described
//! in RFC 8554 appendix A, so a whole leaf array is reproducible from
//! `(I, seed)`. A private key signs **at most once**: signing consumes the
//! key, and further attempts are rejected.
//!
//! ## Important Note
//!
//! This LM-OTS implementation is provided to be used inside the LMS scheme
//! and is optimized for that use. Verification at this level only recovers
//! a *candidate* public key from a signature; the candidate is never
//! judged here. A forged signature simply yields an unrelated value, and
//! the Merkle root comparison performed by the LMS verifier is the single
//! point where validity is decided.

use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::params::{
    LmotsAlgorithmType, LmotsParameter, I_KEY_ID_LEN, LMOTS_N_HASH_LEN_MAX, LMOTS_TYPE_LEN,
};
use crate::utils::{get_u32_at, set_u32_at, u16_to_bytes, u32_to_bytes};

/// Domain separator for the public-key hash, `D_PBLC`.
const D_PBLC: [u8; 2] = [0x80, 0x80];

/// Domain separator for the message hash, `D_MESG`.
const D_MESG: [u8; 2] = [0x81, 0x81];

/// Marker byte for the appendix A pseudo-random chain-head expansion.
const D_PRG: u8 = 0xff;

/// The `(otstype, I, q)` triple that pins an LM-OTS key to one leaf of one
/// LMS keypair. Every hash computed by this module absorbs `I` and `q`
/// first, so chains of different leaves and different keys never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmotsParameters {
    pub(crate) ots: LmotsParameter,
    pub(crate) key_id: [u8; I_KEY_ID_LEN],
    pub(crate) q: u32,
}

impl LmotsParameters {
    /// Binds an LM-OTS parameter set to leaf `q` of the key identified by
    /// `key_id`.
    pub fn new(otstype: LmotsAlgorithmType, key_id: [u8; I_KEY_ID_LEN], q: u32) -> Self {
        Self::with_parameter(otstype.parameter(), key_id, q)
    }

    pub(crate) fn with_parameter(ots: LmotsParameter, key_id: [u8; I_KEY_ID_LEN], q: u32) -> Self {
        Self { ots, key_id, q }
    }
}

/// An LM-OTS private key: the `p` chain heads for one leaf.
///
/// The chain material is zeroized when the key is dropped, and a key that
/// has produced its one signature refuses to sign again.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LmotsPrivateKey {
    #[zeroize(skip)]
    params: LmotsParameters,
    x: Vec<u8>,
    #[zeroize(skip)]
    used: bool,
}

/// An LM-OTS public key: the n-byte hash `K` binding all chain tails.
#[derive(Clone, Debug, Zeroize)]
pub struct LmotsPublicKey {
    #[zeroize(skip)]
    params: LmotsParameters,
    k: [u8; LMOTS_N_HASH_LEN_MAX],
}

/// The private/public key pair of a single LMS leaf.
#[derive(Clone, Zeroize)]
pub struct LmotsKeyPair {
    pub(crate) private: LmotsPrivateKey,
    pub(crate) public: LmotsPublicKey,
}

impl LmotsPrivateKey {
    /// Expands `seed` into the private key of leaf `q` under key
    /// identifier `key_id`.
    ///
    /// Chain head `i` is `H(I || u32(q) || u16(i) || 0xff || seed)` per
    /// RFC 8554 appendix A, so the expansion is deterministic given
    /// `(I, q, seed)` and the whole leaf array of an LMS key can be
    /// regenerated from its seed.
    pub fn new(
        otstype: LmotsAlgorithmType,
        key_id: &[u8; I_KEY_ID_LEN],
        q: u32,
        seed: &[u8],
    ) -> Self {
        Self::with_parameter(otstype.parameter(), key_id, q, seed)
    }

    pub(crate) fn with_parameter(
        ots: LmotsParameter,
        key_id: &[u8; I_KEY_ID_LEN],
        q: u32,
        seed: &[u8],
    ) -> Self {
        let params = LmotsParameters::with_parameter(ots, *key_id, q);
        let n = ots.n;
        let mut x = vec![0u8; ots.p * n];
        for i in 0..ots.p {
            let mut hasher = Sha256::new();
            hasher.update(params.key_id);
            hasher.update(u32_to_bytes(q));
            hasher.update(u16_to_bytes(i as u16));
            hasher.update([D_PRG]);
            hasher.update(seed);
            x[i * n..(i + 1) * n].copy_from_slice(&hasher.finalize()[..n]);
        }
        Self {
            params,
            x,
            used: false,
        }
    }

    /// Derives the public key `K` from this private key.
    ///
    /// Fails with [`Error::BadInputData`] once the key has signed, as the
    /// chain material is destroyed by signing.
    pub fn public_key(&self) -> Result<LmotsPublicKey> {
        if self.used {
            return Err(Error::BadInputData);
        }
        Ok(derive_public_key(&self.params, &self.x))
    }

    /// Produces the one-time signature of `message` into `signature`.
    ///
    /// The randomizer `C` is drawn from `rng`. The key is consumed: its
    /// chain material is zeroized and any further call returns
    /// [`Error::BadInputData`].
    ///
    /// # Arguments
    ///
    /// * `rng` - Source of the n-byte message randomizer.
    /// * `message` - The message bytes to sign.
    /// * `signature` - Output buffer of at least
    ///   [`LmotsParameter::signature_len`] bytes.
    pub fn sign<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        message: &[u8],
        signature: &mut [u8],
    ) -> Result<()> {
        let ots = self.params.ots;
        let n = ots.n;
        if self.used {
            return Err(Error::BadInputData);
        }
        if signature.len() < ots.signature_len() {
            return Err(Error::BufferTooSmall);
        }

        set_u32_at(signature, ots.type_id, 0);
        rng.fill_bytes(&mut signature[LMOTS_TYPE_LEN..LMOTS_TYPE_LEN + n]);

        let digest = message_digest(
            &self.params,
            &signature[LMOTS_TYPE_LEN..LMOTS_TYPE_LEN + n],
            message,
        );
        for i in 0..ots.p {
            let a = coef(&digest[..n + 2], i, ots.w) as u32;
            let out = &mut signature[LMOTS_TYPE_LEN + n * (i + 1)..LMOTS_TYPE_LEN + n * (i + 2)];
            out.copy_from_slice(&self.x[i * n..(i + 1) * n]);
            chain(&self.params, i as u16, 0, a, out);
        }

        // One-time: the chain heads must never produce a second signature.
        self.x.zeroize();
        self.used = true;
        Ok(())
    }
}

impl LmotsPublicKey {
    /// The n valid bytes of `K`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.k[..self.params.ots.n]
    }
}

impl LmotsKeyPair {
    /// Generates the key pair of leaf `q` from `(I, q, seed)`.
    pub(crate) fn generate(
        ots: LmotsParameter,
        key_id: &[u8; I_KEY_ID_LEN],
        q: u32,
        seed: &[u8],
    ) -> Self {
        let private = LmotsPrivateKey::with_parameter(ots, key_id, q, seed);
        let public = derive_public_key(&private.params, &private.x);
        Self { private, public }
    }
}

/// Recovers the public-key *candidate* encoded by `signature` over
/// `message`.
///
/// Each chain value in the signature is advanced from its digit position
/// to the chain tail, and the tails are hashed into a candidate `K`. A
/// genuine signature yields the true public key; any other signature
/// yields an unrelated value. No validity judgement is made here.
pub fn recover_public_key_candidate(
    params: &LmotsParameters,
    message: &[u8],
    signature: &[u8],
) -> Result<[u8; LMOTS_N_HASH_LEN_MAX]> {
    let ots = params.ots;
    let n = ots.n;
    if signature.len() != ots.signature_len() {
        return Err(Error::BadInputData);
    }
    if get_u32_at(signature, 0) != ots.type_id {
        return Err(Error::BadInputData);
    }

    let digest = message_digest(params, &signature[LMOTS_TYPE_LEN..LMOTS_TYPE_LEN + n], message);

    let mut hasher = Sha256::new();
    hasher.update(params.key_id);
    hasher.update(u32_to_bytes(params.q));
    hasher.update(D_PBLC);
    let mut tmp = [0u8; LMOTS_N_HASH_LEN_MAX];
    for i in 0..ots.p {
        let a = coef(&digest[..n + 2], i, ots.w) as u32;
        tmp[..n].copy_from_slice(
            &signature[LMOTS_TYPE_LEN + n * (i + 1)..LMOTS_TYPE_LEN + n * (i + 2)],
        );
        chain(params, i as u16, a, (1 << ots.w) - 1, &mut tmp[..n]);
        hasher.update(&tmp[..n]);
    }

    let mut candidate = [0u8; LMOTS_N_HASH_LEN_MAX];
    candidate[..n].copy_from_slice(&hasher.finalize()[..n]);
    Ok(candidate)
}

fn derive_public_key(params: &LmotsParameters, x: &[u8]) -> LmotsPublicKey {
    let ots = params.ots;
    let n = ots.n;
    let mut hasher = Sha256::new();
    hasher.update(params.key_id);
    hasher.update(u32_to_bytes(params.q));
    hasher.update(D_PBLC);
    let mut tmp = [0u8; LMOTS_N_HASH_LEN_MAX];
    for i in 0..ots.p {
        tmp[..n].copy_from_slice(&x[i * n..(i + 1) * n]);
        chain(params, i as u16, 0, (1 << ots.w) - 1, &mut tmp[..n]);
        hasher.update(&tmp[..n]);
    }
    let mut k = [0u8; LMOTS_N_HASH_LEN_MAX];
    k[..n].copy_from_slice(&hasher.finalize()[..n]);
    LmotsPublicKey { params: *params, k }
}

/// Advances `value` through the Winternitz chain of index `i`, applying
/// the iteration hashes for steps `start..end`.
fn chain(params: &LmotsParameters, i: u16, start: u32, end: u32, value: &mut [u8]) {
    let n = params.ots.n;
    for j in start..end {
        let mut hasher = Sha256::new();
        hasher.update(params.key_id);
        hasher.update(u32_to_bytes(params.q));
        hasher.update(u16_to_bytes(i));
        hasher.update([j as u8]);
        hasher.update(&value[..n]);
        value[..n].copy_from_slice(&hasher.finalize()[..n]);
    }
}

/// Computes `Q || cksm(Q)`: the randomized message hash followed by its
/// 16-bit Winternitz checksum. The first `n + 2` bytes of the result are
/// the digit string the chains walk over.
fn message_digest(
    params: &LmotsParameters,
    c: &[u8],
    message: &[u8],
) -> [u8; LMOTS_N_HASH_LEN_MAX + 2] {
    let n = params.ots.n;
    let mut out = [0u8; LMOTS_N_HASH_LEN_MAX + 2];
    let mut hasher = Sha256::new();
    hasher.update(params.key_id);
    hasher.update(u32_to_bytes(params.q));
    hasher.update(D_MESG);
    hasher.update(c);
    hasher.update(message);
    out[..n].copy_from_slice(&hasher.finalize()[..n]);
    let cksm = checksum(&params.ots, &out[..n]);
    out[n..n + 2].copy_from_slice(&u16_to_bytes(cksm));
    out
}

/// RFC 8554 section 4.4 checksum over the message digits of `q_digest`.
fn checksum(ots: &LmotsParameter, q_digest: &[u8]) -> u16 {
    let mut sum = 0u16;
    for i in 0..(ots.n * 8 / ots.w as usize) {
        sum = sum.wrapping_add((1u16 << ots.w) - 1);
        sum = sum.wrapping_sub(coef(q_digest, i, ots.w) as u16);
    }
    sum << ots.ls
}

/// The `i`-th w-bit digit of `bytes`, most significant digits first.
fn coef(bytes: &[u8], i: usize, w: u32) -> u8 {
    let w = w as usize;
    let mask = ((1u32 << w) - 1) as u8;
    (bytes[(i * w) / 8] >> (8 - (w * (i % (8 / w)) + w))) & mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::RngCore;

    fn test_params() -> (LmotsAlgorithmType, [u8; I_KEY_ID_LEN]) {
        let mut key_id = [0u8; I_KEY_ID_LEN];
        OsRng.fill_bytes(&mut key_id);
        (LmotsAlgorithmType::Sha256N32W8, key_id)
    }

    #[test]
    fn test_coef_w8_is_byte_indexing() {
        let bytes = [0x01u8, 0xab, 0xff, 0x00];
        for (i, &b) in bytes.iter().enumerate() {
            assert_eq!(coef(&bytes, i, 8), b);
        }
    }

    #[test]
    fn test_checksum_extremes() {
        let ots = LmotsAlgorithmType::Sha256N32W8.parameter();
        // All-zero digits: every digit contributes 2^w - 1.
        assert_eq!(checksum(&ots, &[0u8; 32]), 32 * 255);
        // All-max digits contribute nothing.
        assert_eq!(checksum(&ots, &[0xffu8; 32]), 0);
    }

    #[test]
    fn test_key_expansion_is_deterministic() {
        let (otstype, key_id) = test_params();
        let seed = [7u8; 32];
        let a = LmotsPrivateKey::new(otstype, &key_id, 3, &seed);
        let b = LmotsPrivateKey::new(otstype, &key_id, 3, &seed);
        assert_eq!(
            a.public_key().unwrap().as_bytes(),
            b.public_key().unwrap().as_bytes()
        );

        // A different leaf index under the same seed gives a different key.
        let c = LmotsPrivateKey::new(otstype, &key_id, 4, &seed);
        assert_ne!(
            a.public_key().unwrap().as_bytes(),
            c.public_key().unwrap().as_bytes()
        );
    }

    #[test]
    fn test_sign_then_recover_matches_public_key() {
        let (otstype, key_id) = test_params();
        let mut sk = LmotsPrivateKey::new(otstype, &key_id, 0, b"lmots test seed");
        let pk = sk.public_key().unwrap();

        let message = b"one-time message";
        let mut signature = vec![0u8; otstype.parameter().signature_len()];
        sk.sign(&mut OsRng, message, &mut signature).unwrap();

        let candidate = recover_public_key_candidate(&sk.params, message, &signature).unwrap();
        assert_eq!(&candidate[..32], pk.as_bytes());

        // A different message recovers an unrelated candidate.
        let other = recover_public_key_candidate(&sk.params, b"other message", &signature).unwrap();
        assert_ne!(&other[..32], pk.as_bytes());

        // Likewise a flipped signature bit.
        let mut tampered = signature.clone();
        tampered[100] ^= 1;
        let candidate = recover_public_key_candidate(&sk.params, message, &tampered).unwrap();
        assert_ne!(&candidate[..32], pk.as_bytes());
    }

    #[test]
    fn test_private_key_signs_only_once() {
        let (otstype, key_id) = test_params();
        let mut sk = LmotsPrivateKey::new(otstype, &key_id, 9, b"seed");
        let mut signature = vec![0u8; otstype.parameter().signature_len()];
        sk.sign(&mut OsRng, b"first", &mut signature).unwrap();
        assert_eq!(
            sk.sign(&mut OsRng, b"second", &mut signature),
            Err(Error::BadInputData)
        );
        assert_eq!(sk.public_key().unwrap_err(), Error::BadInputData);
    }

    #[test]
    fn test_sign_rejects_short_buffer() {
        let (otstype, key_id) = test_params();
        let mut sk = LmotsPrivateKey::new(otstype, &key_id, 0, b"seed");
        let mut short = vec![0u8; otstype.parameter().signature_len() - 1];
        assert_eq!(
            sk.sign(&mut OsRng, b"msg", &mut short),
            Err(Error::BufferTooSmall)
        );
        // The failed attempt must not have consumed the key.
        assert!(sk.public_key().is_ok());
    }

    #[test]
    fn test_recover_rejects_malformed_signature() {
        let (otstype, key_id) = test_params();
        let params = LmotsParameters::new(otstype, key_id, 0);
        let bad_len = vec![0u8; otstype.parameter().signature_len() - 1];
        assert_eq!(
            recover_public_key_candidate(&params, b"msg", &bad_len),
            Err(Error::BadInputData)
        );

        // Wrong embedded type tag.
        let mut wrong_type = vec![0u8; otstype.parameter().signature_len()];
        set_u32_at(&mut wrong_type, 0x0000_0003, 0);
        assert_eq!(
            recover_public_key_candidate(&params, b"msg", &wrong_type),
            Err(Error::BadInputData)
        );
    }
}
