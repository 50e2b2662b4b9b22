//! Parameter registry and wire-layout arithmetic.
//!
//! Every length and field offset of the public-key and signature encodings
//! is derived from the registry rows here, so adding a parameter set is a
//! matter of adding a row: none of the hashing, tree, or verification code
//! depends on a particular geometry.

use crate::error::{Error, Result};

/// Byte length of the LMS type identifier on the wire.
pub const LMS_TYPE_LEN: usize = 4;

/// Byte length of the LM-OTS type identifier on the wire.
pub const LMOTS_TYPE_LEN: usize = 4;

/// Byte length of the per-key identifier `I`.
pub const I_KEY_ID_LEN: usize = 16;

/// Byte length of the leaf index `q` on the wire.
pub const Q_LEAF_ID_LEN: usize = 4;

/// Largest Merkle node size among the registered LMS parameter sets.
pub(crate) const LMS_M_NODE_BYTES_MAX: usize = 32;

/// Largest hash output among the registered LM-OTS parameter sets.
pub(crate) const LMOTS_N_HASH_LEN_MAX: usize = 32;

// Public-key layout (§ RFC 8554 5.3): type, otstype, I, T(1).
pub(crate) const PUBLIC_KEY_TYPE_OFFSET: usize = 0;
pub(crate) const PUBLIC_KEY_OTSTYPE_OFFSET: usize = PUBLIC_KEY_TYPE_OFFSET + LMS_TYPE_LEN;
pub(crate) const PUBLIC_KEY_I_KEY_ID_OFFSET: usize = PUBLIC_KEY_OTSTYPE_OFFSET + LMOTS_TYPE_LEN;
pub(crate) const PUBLIC_KEY_ROOT_NODE_OFFSET: usize = PUBLIC_KEY_I_KEY_ID_OFFSET + I_KEY_ID_LEN;

// Signature layout (RFC 8554 5.4): q, OTS signature, type, path. The
// offsets past the OTS signature depend on the OTS geometry and live on
// [`LmsParameterSet`].
pub(crate) const SIG_Q_LEAF_ID_OFFSET: usize = 0;
pub(crate) const SIG_OTS_SIG_OFFSET: usize = SIG_Q_LEAF_ID_OFFSET + Q_LEAF_ID_LEN;

/// The registered LMS algorithm types.
///
/// Identifiers follow the RFC 8554 / NIST SP 800-208 registry. Only the
/// SHA-256/M32/H10 row is currently accepted on the public surface; any
/// other identifier is rejected with [`Error::BadInputData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LmsAlgorithmType {
    /// SHA-256, 32-byte nodes, tree height 10 (`0x00000006`).
    Sha256M32H10,
}

impl LmsAlgorithmType {
    /// Looks up a wire identifier in the registry.
    pub fn from_type_id(type_id: u32) -> Result<Self> {
        match type_id {
            0x0000_0006 => Ok(Self::Sha256M32H10),
            _ => Err(Error::BadInputData),
        }
    }

    /// The wire identifier of this algorithm type.
    pub fn type_id(self) -> u32 {
        self.parameter().type_id
    }

    pub(crate) fn parameter(self) -> LmsParameter {
        match self {
            Self::Sha256M32H10 => LmsParameter {
                type_id: 0x0000_0006,
                m: 32,
                h: 10,
            },
        }
    }
}

/// The registered LM-OTS algorithm types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LmotsAlgorithmType {
    /// SHA-256, 32-byte hashes, Winternitz parameter 8 (`0x00000004`).
    Sha256N32W8,
}

impl LmotsAlgorithmType {
    /// Looks up a wire identifier in the registry.
    pub fn from_type_id(type_id: u32) -> Result<Self> {
        match type_id {
            0x0000_0004 => Ok(Self::Sha256N32W8),
            _ => Err(Error::BadInputData),
        }
    }

    /// The wire identifier of this algorithm type.
    pub fn type_id(self) -> u32 {
        self.parameter().type_id
    }

    pub(crate) fn parameter(self) -> LmotsParameter {
        match self {
            Self::Sha256N32W8 => LmotsParameter {
                type_id: 0x0000_0004,
                n: 32,
                w: 8,
                p: 34,
                ls: 0,
            },
        }
    }
}

/// One row of the LMS parameter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LmsParameter {
    pub(crate) type_id: u32,
    /// Merkle node (hash output) length in bytes.
    pub(crate) m: usize,
    /// Tree height; the tree has `2^h` leaves.
    pub(crate) h: u32,
}

impl LmsParameter {
    /// Number of leaves, `2^h`. Leaf `q` sits at node index `2^h + q`.
    pub(crate) fn leaf_count(&self) -> u32 {
        1 << self.h
    }

    /// Number of node slots in the dense tree array, `2^(h+1)`.
    /// Slot 0 is unused so that the parent of node `r` is `r / 2`.
    pub(crate) fn node_count(&self) -> usize {
        1 << (self.h + 1)
    }
}

/// One row of the LM-OTS parameter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LmotsParameter {
    pub(crate) type_id: u32,
    /// Hash output length in bytes.
    pub(crate) n: usize,
    /// Winternitz parameter: each chain digit covers `w` bits.
    pub(crate) w: u32,
    /// Number of Winternitz chains (message digits plus checksum digits).
    pub(crate) p: usize,
    /// Left-shift applied to the checksum before digit extraction.
    pub(crate) ls: u32,
}

impl LmotsParameter {
    /// Total length of an LM-OTS signature:
    /// type tag, randomizer `C`, and `p` chain values.
    pub(crate) fn signature_len(&self) -> usize {
        LMOTS_TYPE_LEN + self.n * (self.p + 1)
    }
}

/// The `(type, otstype, I)` triple shared by a keypair: the LMS and LM-OTS
/// geometries plus the 16-byte key identifier that domain-separates every
/// hash computed under this key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LmsParameterSet {
    pub(crate) lms: LmsParameter,
    pub(crate) ots: LmotsParameter,
    pub(crate) key_id: [u8; I_KEY_ID_LEN],
}

impl LmsParameterSet {
    pub(crate) fn new(
        typ: LmsAlgorithmType,
        otstype: LmotsAlgorithmType,
        key_id: [u8; I_KEY_ID_LEN],
    ) -> Self {
        Self {
            lms: typ.parameter(),
            ots: otstype.parameter(),
            key_id,
        }
    }

    /// Serialized public-key length: type, otstype, `I`, root node.
    pub(crate) fn public_key_len(&self) -> usize {
        PUBLIC_KEY_ROOT_NODE_OFFSET + self.lms.m
    }

    /// Offset of the LMS type tag inside a signature.
    pub(crate) fn sig_type_offset(&self) -> usize {
        SIG_OTS_SIG_OFFSET + self.ots.signature_len()
    }

    /// Offset of the authentication path inside a signature.
    pub(crate) fn sig_path_offset(&self) -> usize {
        self.sig_type_offset() + LMS_TYPE_LEN
    }

    /// Serialized signature length: `q`, OTS signature, type, `h` path nodes.
    pub(crate) fn signature_len(&self) -> usize {
        self.sig_path_offset() + self.lms.m * self.lms.h as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_accepts_registered_ids() {
        assert_eq!(
            LmsAlgorithmType::from_type_id(0x0000_0006),
            Ok(LmsAlgorithmType::Sha256M32H10)
        );
        assert_eq!(
            LmotsAlgorithmType::from_type_id(0x0000_0004),
            Ok(LmotsAlgorithmType::Sha256N32W8)
        );
    }

    #[test]
    fn test_registry_rejects_unknown_ids() {
        for id in [0x0000_0000, 0x0000_0001, 0x0000_0005, 0x0000_0007, u32::MAX] {
            assert_eq!(LmsAlgorithmType::from_type_id(id), Err(Error::BadInputData));
        }
        for id in [0x0000_0000, 0x0000_0003, 0x0000_0005, u32::MAX] {
            assert_eq!(
                LmotsAlgorithmType::from_type_id(id),
                Err(Error::BadInputData)
            );
        }
    }

    #[test]
    fn test_wire_lengths_for_registered_pair() {
        let params = LmsParameterSet::new(
            LmsAlgorithmType::Sha256M32H10,
            LmotsAlgorithmType::Sha256N32W8,
            [0u8; I_KEY_ID_LEN],
        );
        // 4 + 4 + 16 + 32
        assert_eq!(params.public_key_len(), 56);
        // OTS: 4 + 32 * 35
        assert_eq!(params.ots.signature_len(), 1124);
        // 4 + 1124 + 4 + 32 * 10
        assert_eq!(params.signature_len(), 1452);
        assert_eq!(params.sig_type_offset(), 1128);
        assert_eq!(params.sig_path_offset(), 1132);
        assert_eq!(params.lms.leaf_count(), 1024);
        assert_eq!(params.lms.node_count(), 2048);
    }
}
