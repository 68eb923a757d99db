//! [EIP-4844] blob and sidecar types.
//!
//! The KZG polynomial commitment scheme itself is external: implement the
//! [`Kzg`] trait over your preferred backend and hand it to
//! [`SidecarBuilder::build`].
//!
//! [EIP-4844]: https://eips.ethereum.org/EIPS/eip-4844

use alloy_primitives::{keccak256, FixedBytes, B256};
use serde::{Deserialize, Serialize};

mod builder;
pub use builder::SidecarBuilder;

pub mod utils;

/// The number of field elements in a blob.
pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;

/// The size of a field element, in bytes.
pub const FIELD_ELEMENT_BYTES: usize = 32;

/// Useful bytes per field element: the top byte stays zero so every element
/// is canonical within the BLS modulus.
pub const USABLE_BYTES_PER_FIELD_ELEMENT: usize = 31;

/// The size of a blob, in bytes.
pub const BYTES_PER_BLOB: usize = FIELD_ELEMENTS_PER_BLOB * FIELD_ELEMENT_BYTES;

/// Useful bytes per blob.
pub const USABLE_BYTES_PER_BLOB: usize = FIELD_ELEMENTS_PER_BLOB * USABLE_BYTES_PER_FIELD_ELEMENT;

/// The version byte of blob versioned hashes.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// A blob: 4096 field elements of 32 bytes each.
pub type Blob = FixedBytes<131072>;

/// A KZG commitment to a blob.
pub type KzgCommitment = FixedBytes<48>;

/// A KZG proof for a blob against its commitment.
pub type KzgProof = FixedBytes<48>;

/// A KZG backend capability.
///
/// Implementations wrap an actual trusted-setup-backed library. This crate
/// only consumes the two per-blob operations the sidecar needs.
pub trait Kzg {
    /// The error type raised by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compute the commitment to a blob.
    fn blob_to_commitment(&self, blob: &Blob) -> Result<KzgCommitment, Self::Error>;

    /// Compute the proof for a blob against its commitment.
    fn compute_blob_proof(
        &self,
        blob: &Blob,
        commitment: &KzgCommitment,
    ) -> Result<KzgProof, Self::Error>;
}

impl<K: Kzg + ?Sized> Kzg for &K {
    type Error = K::Error;

    fn blob_to_commitment(&self, blob: &Blob) -> Result<KzgCommitment, Self::Error> {
        (**self).blob_to_commitment(blob)
    }

    fn compute_blob_proof(
        &self,
        blob: &Blob,
        commitment: &KzgCommitment,
    ) -> Result<KzgProof, Self::Error> {
        (**self).compute_blob_proof(blob, commitment)
    }
}

/// Derive the on-chain versioned hash of a commitment:
/// the version byte followed by the tail of the commitment's hash.
pub fn kzg_to_versioned_hash(commitment: &KzgCommitment) -> B256 {
    let mut hash = keccak256(commitment.as_slice());
    hash.0[0] = VERSIONED_HASH_VERSION_KZG;
    hash
}

/// The off-chain payload of an EIP-4844 blob transaction: blobs with their
/// matching commitments and proofs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobTransactionSidecar {
    /// The blobs.
    pub blobs: Vec<Blob>,
    /// One commitment per blob.
    pub commitments: Vec<KzgCommitment>,
    /// One proof per blob.
    pub proofs: Vec<KzgProof>,
}

impl BlobTransactionSidecar {
    /// Construct a sidecar from matching-length parts.
    pub fn new(blobs: Vec<Blob>, commitments: Vec<KzgCommitment>, proofs: Vec<KzgProof>) -> Self {
        debug_assert_eq!(blobs.len(), commitments.len());
        debug_assert_eq!(blobs.len(), proofs.len());
        Self { blobs, commitments, proofs }
    }

    /// The number of blobs in the sidecar.
    pub fn size(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if the sidecar carries no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// The versioned hashes committing to the blobs on-chain.
    pub fn versioned_hashes(&self) -> Vec<B256> {
        self.commitments.iter().map(kzg_to_versioned_hash).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_geometry() {
        assert_eq!(BYTES_PER_BLOB, 131_072);
        assert_eq!(USABLE_BYTES_PER_BLOB, 126_976);
    }

    #[test]
    fn versioned_hash_carries_version_byte() {
        let commitment = KzgCommitment::repeat_byte(0x42);
        let hash = kzg_to_versioned_hash(&commitment);
        assert_eq!(hash[0], VERSIONED_HASH_VERSION_KZG);
        // The tail is the hash of the commitment bytes.
        assert_eq!(hash[1..], keccak256(commitment.as_slice())[1..]);
    }
}
