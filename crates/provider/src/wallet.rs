use crate::{
    fill::{fill_fees, fill_gas_limit, fill_nonce, fill_transaction},
    ChainProfile, PendingTransactionBuilder, Provider, RootProvider, TxError,
};
use ferrite_rpc_types::{BlobTransactionRequest, TransactionReceipt, TransactionRequest};
use ferrite_signer::TxSigner;
use ferrite_transport::Transport;
use std::{marker::PhantomData, time::Duration};
use tracing::debug;

/// The Signer capability: a [`Provider`] paired with a [`TxSigner`] and a
/// [`ChainProfile`].
///
/// `send_transaction` runs the full pipeline: chain-id enforcement, field
/// resolution (nonce, fees, gas, blob fee), signing, submission, and
/// optionally waiting for the receipt. Explicit caller fields are never
/// overwritten.
#[derive(Clone, Debug)]
pub struct WalletProvider<P, S, T> {
    inner: P,
    signer: S,
    profile: ChainProfile,
    _transport: PhantomData<T>,
}

impl<P, S, T> WalletProvider<P, S, T> {
    /// Pair a provider with a signer and a chain profile.
    pub const fn new(inner: P, signer: S, profile: ChainProfile) -> Self {
        Self { inner, signer, profile, _transport: PhantomData }
    }

    /// The signer.
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// The chain profile.
    pub const fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    /// The wrapped Reader-tier provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<T, P, S> Provider<T> for WalletProvider<P, S, T>
where
    T: Transport + Clone,
    P: Provider<T>,
    S: Send + Sync,
{
    fn root(&self) -> &RootProvider<T> {
        self.inner.root()
    }
}

impl<T, P, S> WalletProvider<P, S, T>
where
    T: Transport + Clone,
    P: Provider<T>,
    S: TxSigner,
{
    /// Enforce that the node serves the configured chain.
    ///
    /// Runs before anything is filled or signed: a mismatch must not cost a
    /// signature.
    async fn check_chain_id(&self) -> Result<(), TxError> {
        let actual = self.inner.get_chain_id().await?;
        if actual != self.profile.chain_id {
            return Err(TxError::ChainMismatch { expected: self.profile.chain_id, actual });
        }
        Ok(())
    }

    /// Resolve the absent fields of a request without sending it.
    pub async fn fill(&self, mut req: TransactionRequest) -> Result<TransactionRequest, TxError> {
        req.validate()?;
        if req.from.is_none() {
            req.from = Some(self.signer.address());
        }
        fill_transaction(&self.inner, &self.profile, &mut req).await?;
        req.chain_id = Some(self.profile.chain_id);
        Ok(req)
    }

    /// Run the pipeline: enforce the chain id, fill, sign, and submit.
    ///
    /// Returns a [`PendingTransactionBuilder`] for awaiting the receipt.
    pub async fn send_transaction(
        &self,
        req: TransactionRequest,
    ) -> Result<PendingTransactionBuilder<T>, TxError> {
        self.check_chain_id().await?;
        let req = self.fill(req).await?;

        debug!(to = ?req.to, nonce = ?req.nonce, gas = ?req.gas_limit, "[TX-SEND] submitting transaction");
        let raw = self.signer.sign_request(&req).await?;
        let tx_hash = self.inner.send_raw_transaction(&raw).await.map_err(TxError::from)?;
        debug!(%tx_hash, "[TX-HASH] accepted by node");

        Ok(PendingTransactionBuilder::new(self.inner.root().clone(), tx_hash))
    }

    /// Run the pipeline for an EIP-4844 blob transaction.
    ///
    /// The steps run in the same fixed order as the plain pipeline, with the
    /// blob fee resolved between the fee and gas-limit steps: an absent
    /// `max_fee_per_blob_gas` becomes `max(2 * eth_blobBaseFee,
    /// profile.min_blob_fee)`. The versioned hashes are derived from the
    /// sidecar.
    pub async fn send_blob_transaction(
        &self,
        mut req: BlobTransactionRequest,
    ) -> Result<PendingTransactionBuilder<T>, TxError> {
        req.validate()?;
        self.check_chain_id().await?;

        if req.tx.from.is_none() {
            req.tx.from = Some(self.signer.address());
        }
        fill_nonce(&self.inner, &mut req.tx).await?;
        fill_fees(&self.inner, &self.profile, &mut req.tx).await?;
        if req.max_fee_per_blob_gas.is_none() {
            let blob_base_fee = self.inner.get_blob_base_fee().await?;
            req.max_fee_per_blob_gas =
                Some(blob_base_fee.saturating_mul(2).max(self.profile.min_blob_fee));
        }
        fill_gas_limit(&self.inner, &self.profile, &mut req.tx).await?;
        req.tx.chain_id = Some(self.profile.chain_id);

        let req = req.build()?;

        debug!(to = ?req.tx.to, blobs = req.sidecar.size(), "[TX-SEND] submitting blob transaction");
        let raw = self.signer.sign_blob_request(&req).await?;
        let tx_hash = self.inner.send_raw_transaction(&raw).await.map_err(TxError::from)?;
        debug!(%tx_hash, "[TX-HASH] accepted by node");

        Ok(PendingTransactionBuilder::new(self.inner.root().clone(), tx_hash))
    }

    /// Run the pipeline and wait for the receipt, polling every
    /// `poll_interval` until `timeout` elapses.
    pub async fn send_transaction_and_wait(
        &self,
        req: TransactionRequest,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, TxError> {
        self.send_transaction(req)
            .await?
            .with_timeout(timeout)
            .with_poll_interval(poll_interval)
            .get_receipt()
            .await
    }
}
