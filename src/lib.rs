//! # LMS: The Leighton-Micali Stateful Hash-Based Signature Scheme
//!
//! This crate implements the LMS signature scheme of
//! [RFC 8554](https://datatracker.ietf.org/doc/html/rfc8554), following the
//! parameter recommendations of
//! [NIST SP 800-208](https://doi.org/10.6028/NIST.SP.800-208). LMS is a
//! post-quantum secure signature scheme built entirely from a hash
//! function: a Merkle tree of one-time Leighton-Micali signatures
//! (LM-OTS). The private key holds `2^h` one-time leaf keys; the public
//! key is the 32-byte Merkle root; each signature spends one leaf and
//! carries the sibling-hash path authenticating that leaf against the
//! root.
//!
//! ## Cryptographic structure
//!
//! - [`lmots`] implements the one-time primitive (RFC 8554 section 4):
//!   Winternitz hash chains over a randomized message digest, with
//!   pseudo-random leaf-key expansion per appendix A.
//! - The Merkle layer hashes leaves and internal nodes with distinct
//!   domain separators and 1-based node indexing, so the parent of node
//!   `r` is simply `r / 2`.
//! - [`lms`] binds the two together: key generation, the stateful signer,
//!   the verifier, and the byte-exact wire encodings.
//!
//! All hashing uses SHA-256. The registered parameter sets are
//! `LMS_SHA256_M32_H10` (1024 leaves) with `LMOTS_SHA256_N32_W8`; the
//! layout arithmetic is table-driven, so further RFC 8554 registry rows
//! are additions to the parameter table rather than new code.
//!
//! ## Statefulness warning
//!
//! LMS is stateful: the private key contains a monotone counter of
//! consumed leaves, and **reusing a leaf destroys the security of the
//! key**. Signing always advances the counter before the signature is
//! produced. Callers that persist private keys must durably store the
//! advanced state *before* releasing a signature to anyone, and must
//! never operate two copies of the same private key. See
//! [`lms::LmsPrivateKey::sign`] for the full contract.
//!
//! ## Example
//!
//! ```no_run
//! use lms::{LmsAlgorithmType, LmotsAlgorithmType, LmsPrivateKey, LmsPublicKey};
//! use rand::rngs::OsRng;
//! use rand::RngCore;
//!
//! let mut seed = [0u8; 32];
//! OsRng.fill_bytes(&mut seed);
//!
//! let mut sk = LmsPrivateKey::generate(
//!     LmsAlgorithmType::Sha256M32H10,
//!     LmotsAlgorithmType::Sha256N32W8,
//!     &mut OsRng,
//!     &seed,
//! )
//! .expect("key generation failed");
//! let pk = sk.public_key();
//!
//! let message = b"interoperable stateful signatures";
//! let mut signature = vec![0u8; sk.signature_len()];
//! let written = sk.sign(&mut OsRng, message, &mut signature)
//!     .expect("signing failed");
//! pk.verify(message, &signature[..written]).expect("verification failed");
//!
//! // The public key round-trips through its RFC 8554 wire encoding.
//! let mut encoded = vec![0u8; pk.public_key_len()];
//! pk.export(&mut encoded).expect("export failed");
//! let imported = LmsPublicKey::import(&encoded).expect("import failed");
//! assert_eq!(imported, pk);
//! ```
//!
//! ## Notes
//!
//! Key generation expands all `2^h` leaf key pairs and parallelizes the
//! work with `rayon`. Private key material is zeroized on drop, and the
//! root comparison during verification is constant-time. The crate
//! performs no I/O of its own; persistence of the signing state is the
//! caller's responsibility.

pub mod error;
pub mod lmots;
pub mod lms;
mod merkle;
pub mod params;
mod utils;

pub use error::{Error, Result};
pub use lms::{LmsPrivateKey, LmsPublicKey};
pub use params::{LmsAlgorithmType, LmotsAlgorithmType};
