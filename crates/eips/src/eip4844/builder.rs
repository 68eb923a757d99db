use crate::eip4844::{
    utils::minimum_fe_for_bytes, Blob, BlobTransactionSidecar, Kzg, BYTES_PER_BLOB,
    FIELD_ELEMENTS_PER_BLOB, FIELD_ELEMENT_BYTES, USABLE_BYTES_PER_FIELD_ELEMENT,
};

/// Builds a [`BlobTransactionSidecar`] from arbitrary user bytes.
///
/// The payload is packed into field elements of
/// [`USABLE_BYTES_PER_FIELD_ELEMENT`] useful bytes each: the top byte of
/// every 32-byte element stays zero, which keeps the element canonical
/// within the scalar field regardless of the data. The final element is
/// zero-padded; consumers that need an exact length should carry it in the
/// payload itself.
///
/// [`build`](Self::build) computes one commitment and one proof per blob
/// through the provided [`Kzg`] backend. The resulting sidecar always holds
/// at least one blob, even for an empty payload.
#[derive(Clone, Debug)]
pub struct SidecarBuilder {
    blobs: Vec<Blob>,
}

impl Default for SidecarBuilder {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

impl SidecarBuilder {
    /// Pack the given bytes into blobs.
    pub fn from_slice(data: &[u8]) -> Self {
        let fe_count = minimum_fe_for_bytes(data.len()).max(1);
        let blob_count = fe_count.div_ceil(FIELD_ELEMENTS_PER_BLOB);

        let mut blobs = vec![Blob::from([0u8; BYTES_PER_BLOB]); blob_count];
        for (i, chunk) in data.chunks(USABLE_BYTES_PER_FIELD_ELEMENT).enumerate() {
            let blob = &mut blobs[i / FIELD_ELEMENTS_PER_BLOB];
            let offset = (i % FIELD_ELEMENTS_PER_BLOB) * FIELD_ELEMENT_BYTES;
            // The first byte of each field element is left zero.
            blob[offset + 1..offset + 1 + chunk.len()].copy_from_slice(chunk);
        }

        Self { blobs }
    }

    /// The number of blobs the sidecar will contain.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if no blobs would be produced. Never the case for
    /// builders created through [`from_slice`](Self::from_slice).
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Compute commitments and proofs for every blob, producing the sidecar.
    pub fn build<K: Kzg>(self, kzg: &K) -> Result<BlobTransactionSidecar, K::Error> {
        let mut commitments = Vec::with_capacity(self.blobs.len());
        let mut proofs = Vec::with_capacity(self.blobs.len());

        for blob in &self.blobs {
            let commitment = kzg.blob_to_commitment(blob)?;
            let proof = kzg.compute_blob_proof(blob, &commitment)?;
            commitments.push(commitment);
            proofs.push(proof);
        }

        Ok(BlobTransactionSidecar::new(self.blobs, commitments, proofs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip4844::{KzgCommitment, KzgProof, USABLE_BYTES_PER_BLOB};
    use alloy_primitives::keccak256;
    use std::convert::Infallible;

    /// A stand-in backend hashing the inputs; enough to test the plumbing.
    struct FakeKzg;

    impl Kzg for FakeKzg {
        type Error = Infallible;

        fn blob_to_commitment(&self, blob: &Blob) -> Result<KzgCommitment, Self::Error> {
            let hash = keccak256(blob.as_slice());
            Ok(KzgCommitment::from_slice(&[hash.as_slice(), &hash[..16]].concat()))
        }

        fn compute_blob_proof(
            &self,
            blob: &Blob,
            commitment: &KzgCommitment,
        ) -> Result<KzgProof, Self::Error> {
            let hash = keccak256([blob.as_slice(), commitment.as_slice()].concat());
            Ok(KzgProof::from_slice(&[hash.as_slice(), &hash[..16]].concat()))
        }
    }

    #[test]
    fn packs_31_usable_bytes_per_element() {
        let data = vec![0xffu8; 62];
        let builder = SidecarBuilder::from_slice(&data);
        assert_eq!(builder.len(), 1);

        let sidecar = builder.build(&FakeKzg).unwrap();
        let blob = &sidecar.blobs[0];
        // Every 32nd byte is the zero pad; the payload follows it.
        assert_eq!(blob[0], 0);
        assert_eq!(&blob[1..32], &data[..31]);
        assert_eq!(blob[32], 0);
        assert_eq!(&blob[33..64], &data[31..62]);
    }

    #[test]
    fn empty_payload_still_yields_one_blob() {
        let sidecar = SidecarBuilder::from_slice(&[]).build(&FakeKzg).unwrap();
        assert_eq!(sidecar.size(), 1);
        assert!(!sidecar.is_empty());
    }

    #[test]
    fn spills_into_second_blob() {
        let data = vec![1u8; USABLE_BYTES_PER_BLOB + 1];
        let sidecar = SidecarBuilder::from_slice(&data).build(&FakeKzg).unwrap();
        assert_eq!(sidecar.size(), 2);
        assert_eq!(sidecar.commitments.len(), 2);
        assert_eq!(sidecar.proofs.len(), 2);
        assert_eq!(sidecar.versioned_hashes().len(), 2);
    }
}
