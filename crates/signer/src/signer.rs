use crate::SignerError;
use alloy_primitives::{Address, Bytes};
use ferrite_rpc_types::{BlobTransactionRequest, TransactionRequest};

/// A capability for signing transactions.
///
/// Implementations own the key material (or a connection to it) and the
/// transaction envelope encoding: given a request whose fields have all been
/// resolved by the pipeline, a signer returns the raw bytes ready for
/// `eth_sendRawTransaction`.
///
/// The pipeline guarantees that `nonce`, the fee fields, `gas_limit`, and
/// `chain_id` are present by the time a request reaches the signer;
/// implementations should fail with [`SignerError::MissingField`] rather
/// than invent values if handed an unresolved request directly.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait TxSigner: Send + Sync {
    /// The address this signer signs for.
    fn address(&self) -> Address;

    /// Sign a fully-resolved transaction request, returning the encoded raw
    /// transaction.
    async fn sign_request(&self, request: &TransactionRequest) -> Result<Bytes, SignerError>;

    /// Sign a fully-resolved blob transaction request, returning the encoded
    /// raw transaction including its sidecar.
    ///
    /// The default implementation refuses; signers with EIP-4844 support
    /// override it.
    async fn sign_blob_request(
        &self,
        request: &BlobTransactionRequest,
    ) -> Result<Bytes, SignerError> {
        let _ = request;
        Err(SignerError::UnsupportedOperation("eip4844"))
    }
}
