use crate::{error::SimulateError, RootProvider};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use ferrite_json_rpc::{RpcRecv, RpcSend};
use ferrite_rpc_client::ClientRef;
use ferrite_rpc_types::{
    AccessListResult, Block, BlockId, BlockNumberOrTag, Filter, Log, SimulatePayload,
    SimulateResult, SimulatedBlock, Transaction, TransactionReceipt, TransactionRequest,
};
use ferrite_transport::{RpcError, Transport, TransportResult};
use std::borrow::Cow;

/// The Reader capability: chain-state queries and call dispatch over a
/// JSON-RPC transport.
///
/// Implementors provide access to a [`RootProvider`]; every operation has a
/// default implementation lowering to a `(method, params)` pair on the
/// underlying client. Requests inherit the client's middleware stack
/// (retries, deadlines).
///
/// `null` results map to idiomatic absent values (`None`, empty collections)
/// except for queries where null is protocol-illegal, which fail instead.
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait Provider<T: Transport + Clone>: Send + Sync {
    /// The root provider this capability is a view over.
    fn root(&self) -> &RootProvider<T>;

    /// The underlying RPC client.
    fn client(&self) -> ClientRef<'_, T> {
        self.root().client()
    }

    /// Fail fast if the provider has been closed.
    fn check_open(&self) -> TransportResult<()> {
        self.root().ensure_open().map_err(RpcError::local_usage)
    }

    /// Get the chain id (`eth_chainId`). A null result is protocol-illegal.
    async fn get_chain_id(&self) -> TransportResult<u64> {
        self.check_open()?;
        self.client().request("eth_chainId", ()).map_resp(|id: U64| id.to::<u64>()).await
    }

    /// Get the number of the most recent block (`eth_blockNumber`).
    async fn get_block_number(&self) -> TransportResult<u64> {
        self.check_open()?;
        self.client().request("eth_blockNumber", ()).map_resp(|n: U64| n.to::<u64>()).await
    }

    /// Get the balance of an account (`eth_getBalance`).
    async fn get_balance(&self, address: Address, block: BlockId) -> TransportResult<U256> {
        self.check_open()?;
        self.client().request("eth_getBalance", (address, block)).await
    }

    /// Get the code at an address (`eth_getCode`). Null and `"0x"` both mean
    /// no code.
    async fn get_code_at(&self, address: Address, block: BlockId) -> TransportResult<Bytes> {
        self.check_open()?;
        let code: Option<Bytes> = self.client().request("eth_getCode", (address, block)).await?;
        Ok(code.unwrap_or_default())
    }

    /// Get a storage slot (`eth_getStorageAt`). The slot is encoded in
    /// minimal hex, without leading zeros.
    async fn get_storage_at(
        &self,
        address: Address,
        key: U256,
        block: BlockId,
    ) -> TransportResult<U256> {
        self.check_open()?;
        self.client().request("eth_getStorageAt", (address, key, block)).await
    }

    /// Get the transaction count (nonce) of an account
    /// (`eth_getTransactionCount`).
    async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockId,
    ) -> TransportResult<u64> {
        self.check_open()?;
        self.client()
            .request("eth_getTransactionCount", (address, block))
            .map_resp(|n: U64| n.to::<u64>())
            .await
    }

    /// Get a block by number or tag (`eth_getBlockByNumber`), with
    /// transaction hashes. `None` if there is no such block.
    async fn get_block_by_number(&self, tag: BlockNumberOrTag) -> TransportResult<Option<Block>> {
        self.check_open()?;
        self.client().request("eth_getBlockByNumber", (tag, false)).await
    }

    /// Get a block by hash (`eth_getBlockByHash`), with transaction hashes.
    /// `None` if there is no such block.
    async fn get_block_by_hash(&self, hash: B256) -> TransportResult<Option<Block>> {
        self.check_open()?;
        self.client().request("eth_getBlockByHash", (hash, false)).await
    }

    /// Get the most recent block.
    async fn get_latest_block(&self) -> TransportResult<Option<Block>> {
        self.get_block_by_number(BlockNumberOrTag::Latest).await
    }

    /// Get a transaction by hash (`eth_getTransactionByHash`). `None` if the
    /// node does not know the transaction.
    async fn get_transaction_by_hash(&self, hash: B256) -> TransportResult<Option<Transaction>> {
        self.check_open()?;
        self.client().request("eth_getTransactionByHash", (hash,)).await
    }

    /// Get a transaction receipt (`eth_getTransactionReceipt`). `None` while
    /// the transaction is not mined.
    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> TransportResult<Option<TransactionReceipt>> {
        self.check_open()?;
        self.client().request("eth_getTransactionReceipt", (hash,)).await
    }

    /// Get logs matching a filter (`eth_getLogs`). A null result is an empty
    /// list.
    async fn get_logs(&self, filter: &Filter) -> TransportResult<Vec<Log>> {
        self.check_open()?;
        let logs: Option<Vec<Log>> = self.client().request("eth_getLogs", (filter,)).await?;
        Ok(logs.unwrap_or_default())
    }

    /// Execute a call without submitting a transaction (`eth_call`). A null
    /// result is empty return data.
    async fn call(&self, request: &TransactionRequest, block: BlockId) -> TransportResult<Bytes> {
        self.check_open()?;
        request.validate().map_err(RpcError::local_usage)?;
        let data: Option<Bytes> = self.client().request("eth_call", (request, block)).await?;
        Ok(data.unwrap_or_default())
    }

    /// Estimate the gas of a call (`eth_estimateGas`). A null result is
    /// protocol-illegal.
    async fn estimate_gas(
        &self,
        request: &TransactionRequest,
        block: BlockId,
    ) -> TransportResult<u64> {
        self.check_open()?;
        request.validate().map_err(RpcError::local_usage)?;
        self.client()
            .request("eth_estimateGas", (request, block))
            .map_resp(|gas: U64| gas.to::<u64>())
            .await
    }

    /// Get the current legacy gas price (`eth_gasPrice`).
    async fn get_gas_price(&self) -> TransportResult<u128> {
        self.check_open()?;
        self.client()
            .request("eth_gasPrice", ())
            .map_resp(|price: alloy_primitives::U128| price.to::<u128>())
            .await
    }

    /// Get the current blob base fee (`eth_blobBaseFee`).
    async fn get_blob_base_fee(&self) -> TransportResult<u128> {
        self.check_open()?;
        self.client()
            .request("eth_blobBaseFee", ())
            .map_resp(|fee: alloy_primitives::U128| fee.to::<u128>())
            .await
    }

    /// Create an access list for a call (`eth_createAccessList`).
    async fn create_access_list(
        &self,
        request: &TransactionRequest,
        block: BlockId,
    ) -> TransportResult<AccessListResult> {
        self.check_open()?;
        request.validate().map_err(RpcError::local_usage)?;
        self.client().request("eth_createAccessList", (request, block)).await
    }

    /// Broadcast a signed transaction (`eth_sendRawTransaction`), returning
    /// its hash.
    async fn send_raw_transaction(&self, raw: &Bytes) -> TransportResult<B256> {
        self.check_open()?;
        self.client().request("eth_sendRawTransaction", (raw,)).await
    }

    /// Simulate a bundle of calls against overridden state
    /// (`eth_simulateV1`).
    ///
    /// A node without the method yields [`SimulateError::NotSupported`];
    /// that failure is terminal and never retried.
    async fn simulate(
        &self,
        payload: &SimulatePayload,
        block: BlockNumberOrTag,
    ) -> Result<SimulateResult, SimulateError> {
        self.check_open().map_err(SimulateError::Transport)?;
        payload.validate()?;
        let blocks: Vec<SimulatedBlock> =
            self.client().request("eth_simulateV1", (payload, block)).await?;
        blocks.into_iter().next().map(Into::into).ok_or(SimulateError::EmptyResponse)
    }

    /// Send a raw `(method, params)` request.
    async fn raw_request<P, R>(&self, method: Cow<'static, str>, params: P) -> TransportResult<R>
    where
        P: RpcSend + 'static,
        R: RpcRecv,
        Self: Sized,
    {
        self.check_open()?;
        self.client().request(method, params).await
    }

    /// Returns `true` if the transport supports subscriptions.
    #[cfg(feature = "pubsub")]
    fn can_subscribe(&self) -> bool {
        self.client().pubsub_frontend().is_some()
    }

    /// Subscribe to new block headers (`eth_subscribe("newHeads")`).
    #[cfg(feature = "pubsub")]
    async fn subscribe_blocks(
        &self,
    ) -> TransportResult<ferrite_pubsub::Subscription<ferrite_rpc_types::Header>> {
        self.check_open()?;
        self.client().expect_pubsub_frontend()?;
        let local_id: B256 = self
            .client()
            .request("eth_subscribe", (ferrite_rpc_types::SubscriptionKind::NewHeads,))
            .await?;
        Ok(self.client().get_raw_subscription(local_id).await?.into())
    }

    /// Subscribe to logs matching a filter (`eth_subscribe("logs", ...)`).
    #[cfg(feature = "pubsub")]
    async fn subscribe_logs(
        &self,
        filter: &Filter,
    ) -> TransportResult<ferrite_pubsub::Subscription<Log>> {
        self.check_open()?;
        self.client().expect_pubsub_frontend()?;
        let local_id: B256 = self
            .client()
            .request(
                "eth_subscribe",
                (ferrite_rpc_types::SubscriptionKind::Logs, filter.clone()),
            )
            .await?;
        Ok(self.client().get_raw_subscription(local_id).await?.into())
    }

    /// Subscribe to pending transaction hashes
    /// (`eth_subscribe("newPendingTransactions")`).
    #[cfg(feature = "pubsub")]
    async fn subscribe_pending_transactions(
        &self,
    ) -> TransportResult<ferrite_pubsub::Subscription<B256>> {
        self.check_open()?;
        self.client().expect_pubsub_frontend()?;
        let local_id: B256 = self
            .client()
            .request(
                "eth_subscribe",
                (ferrite_rpc_types::SubscriptionKind::NewPendingTransactions,),
            )
            .await?;
        Ok(self.client().get_raw_subscription(local_id).await?.into())
    }

    /// Subscribe to sync-status transitions (`eth_subscribe("syncing")`).
    #[cfg(feature = "pubsub")]
    async fn subscribe_sync_status(
        &self,
    ) -> TransportResult<ferrite_pubsub::Subscription<ferrite_rpc_types::SyncStatus>> {
        self.check_open()?;
        self.client().expect_pubsub_frontend()?;
        let local_id: B256 = self
            .client()
            .request("eth_subscribe", (ferrite_rpc_types::SubscriptionKind::Syncing,))
            .await?;
        Ok(self.client().get_raw_subscription(local_id).await?.into())
    }

    /// Unsubscribe from a subscription by its local id.
    ///
    /// The server is told via `eth_unsubscribe` and the local sink is
    /// released regardless of its acknowledgement. Dropping a
    /// [`Subscription`](ferrite_pubsub::Subscription) handle alone does NOT
    /// unsubscribe.
    #[cfg(feature = "pubsub")]
    fn unsubscribe(&self, local_id: B256) -> TransportResult<()> {
        self.client().unsubscribe(local_id)
    }
}
