use alloy_primitives::{address, Address, Bytes};
use ferrite_provider::{ProviderBuilder, RootProvider};
use ferrite_rpc_types::{BlobTransactionRequest, TransactionRequest};
use ferrite_signer::{SignerError, TxSigner};
use ferrite_transport::mock::{Asserter, MockTransport};
use std::sync::{Arc, Mutex};

pub(crate) const SIGNER_ADDRESS: Address = address!("1111111111111111111111111111111111111111");

/// Connect a root provider to a fresh scripted transport.
pub(crate) fn mocked() -> (RootProvider<MockTransport>, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
    (provider, asserter)
}

/// A signer that returns fixed raw bytes and records what it signed.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingSigner {
    pub(crate) signed: Arc<Mutex<Vec<TransactionRequest>>>,
    pub(crate) signed_blobs: Arc<Mutex<Vec<BlobTransactionRequest>>>,
}

impl RecordingSigner {
    pub(crate) fn last_signed(&self) -> Option<TransactionRequest> {
        self.signed.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_signed_blob(&self) -> Option<BlobTransactionRequest> {
        self.signed_blobs.lock().unwrap().last().cloned()
    }

    pub(crate) fn sign_count(&self) -> usize {
        self.signed.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TxSigner for RecordingSigner {
    fn address(&self) -> Address {
        SIGNER_ADDRESS
    }

    async fn sign_request(&self, request: &TransactionRequest) -> Result<Bytes, SignerError> {
        for field in [
            ("nonce", request.nonce.is_none()),
            ("gas", request.gas_limit.is_none()),
            ("chainId", request.chain_id.is_none()),
        ] {
            if field.1 {
                return Err(SignerError::MissingField(field.0));
            }
        }
        self.signed.lock().unwrap().push(request.clone());
        Ok(Bytes::from_static(b"\xf8\x6b\x80"))
    }

    async fn sign_blob_request(
        &self,
        request: &BlobTransactionRequest,
    ) -> Result<Bytes, SignerError> {
        if request.max_fee_per_blob_gas.is_none() {
            return Err(SignerError::MissingField("maxFeePerBlobGas"));
        }
        self.signed_blobs.lock().unwrap().push(request.clone());
        Ok(Bytes::from_static(b"\x03\xf8\x6b"))
    }
}
