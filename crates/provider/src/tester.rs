use crate::{Provider, SessionClosed, TesterError};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use ferrite_json_rpc::{RpcRecv, RpcSend};
use ferrite_rpc_types::{Forking, SnapshotId, TransactionRequest};
use ferrite_transport::Transport;
use serde::Serialize;
use std::{
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

/// The kind of developer node a [`Tester`] drives.
///
/// Admin method names are built from the node kind's prefix. Time-travel,
/// mining-control, and snapshot methods are the exception: they are `evm_*`
/// on Anvil and Ganache, and `hardhat_*` on Hardhat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestNodeMode {
    /// Foundry's Anvil.
    Anvil,
    /// Hardhat Network.
    Hardhat,
    /// Ganache.
    Ganache,
}

impl TestNodeMode {
    /// The prefix of admin methods.
    pub(crate) const fn admin_prefix(&self) -> &'static str {
        match self {
            Self::Anvil => "anvil_",
            Self::Hardhat => "hardhat_",
            Self::Ganache => "evm_",
        }
    }

    /// The prefix of time-travel, mining-control, and snapshot methods.
    pub(crate) const fn time_prefix(&self) -> &'static str {
        match self {
            Self::Hardhat => "hardhat_",
            Self::Anvil | Self::Ganache => "evm_",
        }
    }
}

/// The Tester capability: the non-standard admin surface of developer-mode
/// EVM nodes.
///
/// A `Tester` wraps any [`Provider`]; the wrapped value keeps its own
/// capabilities and is reachable through [`inner`](Self::inner) (wrap a
/// `WalletProvider` and `inner` is the Signer-tier view).
#[derive(Clone, Debug)]
pub struct Tester<P, T> {
    provider: P,
    mode: TestNodeMode,
    _transport: PhantomData<T>,
}

impl<P, T> Tester<P, T> {
    /// Bind a provider to a test-node kind.
    pub const fn new(provider: P, mode: TestNodeMode) -> Self {
        Self { provider, mode, _transport: PhantomData }
    }

    /// The configured node kind.
    pub const fn mode(&self) -> TestNodeMode {
        self.mode
    }

    /// The wrapped provider.
    pub const fn inner(&self) -> &P {
        &self.provider
    }

    /// Unwrap the provider.
    pub fn into_inner(self) -> P {
        self.provider
    }

    fn admin_method(&self, name: &str) -> String {
        format!("{}{name}", self.mode.admin_prefix())
    }

    fn time_method(&self, name: &str) -> String {
        format!("{}{name}", self.mode.time_prefix())
    }

    const fn require_anvil(&self, operation: &'static str) -> Result<(), TesterError> {
        match self.mode {
            TestNodeMode::Anvil => Ok(()),
            mode => Err(TesterError::UnsupportedOnNodeKind { operation, mode }),
        }
    }
}

/// The node's acknowledgement value, which is inconsistently typed across
/// node kinds and discarded.
type Ack = serde_json::Value;

impl<P, T> Tester<P, T>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    async fn request<Params, Resp>(
        &self,
        method: String,
        params: Params,
    ) -> Result<Resp, TesterError>
    where
        Params: RpcSend,
        Resp: RpcRecv,
    {
        self.provider.root().ensure_open()?;
        Ok(self.provider.client().request(method, params).await?)
    }

    /// Set the balance of an account.
    pub async fn set_balance(&self, address: Address, balance: U256) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setBalance"), (address, balance))
            .await
            .map(drop)
    }

    /// Set the code of an account.
    pub async fn set_code(&self, address: Address, code: Bytes) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setCode"), (address, code)).await.map(drop)
    }

    /// Set the nonce of an account.
    pub async fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setNonce"), (address, U64::from(nonce)))
            .await
            .map(drop)
    }

    /// Write a single slot of an account's storage.
    pub async fn set_storage_at(
        &self,
        address: Address,
        slot: U256,
        value: B256,
    ) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setStorageAt"), (address, slot, value))
            .await
            .map(drop)
    }

    /// Set the gas limit of subsequent blocks.
    pub async fn set_block_gas_limit(&self, gas_limit: u64) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setBlockGasLimit"), (U64::from(gas_limit),))
            .await
            .map(drop)
    }

    /// Set the coinbase address.
    pub async fn set_coinbase(&self, address: Address) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("setCoinbase"), (address,)).await.map(drop)
    }

    /// Set the base fee of the next block.
    pub async fn set_next_block_base_fee(&self, base_fee: u128) -> Result<(), TesterError> {
        self.request::<_, Ack>(
            self.admin_method("setNextBlockBaseFeePerGas"),
            (U256::from(base_fee),),
        )
        .await
        .map(drop)
    }

    /// Set the timestamp of the next block.
    pub async fn set_next_block_timestamp(&self, timestamp: u64) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.time_method("setNextBlockTimestamp"), (U64::from(timestamp),))
            .await
            .map(drop)
    }

    /// Jump forward in time by the given number of seconds.
    pub async fn increase_time(&self, seconds: u64) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.time_method("increaseTime"), (U64::from(seconds),))
            .await
            .map(drop)
    }

    /// Mine `blocks` blocks, optionally `interval` seconds apart.
    pub async fn mine(&self, blocks: u64, interval: Option<u64>) -> Result<(), TesterError> {
        let mut params = vec![U64::from(blocks)];
        if let Some(interval) = interval {
            params.push(U64::from(interval));
        }
        self.request::<_, Ack>(self.time_method("mine"), params).await.map(drop)
    }

    /// Enable or disable automatic mining of a block per transaction.
    pub async fn set_automine(&self, enabled: bool) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.time_method("setAutomine"), (enabled,)).await.map(drop)
    }

    /// Query whether automatic mining is enabled.
    pub async fn get_automine(&self) -> Result<bool, TesterError> {
        self.request::<_, bool>(self.admin_method("getAutomine"), ()).await
    }

    /// Mine blocks on a fixed interval, in seconds.
    pub async fn set_interval_mining(&self, seconds: u64) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.time_method("setIntervalMining"), (U64::from(seconds),))
            .await
            .map(drop)
    }

    /// Start impersonating an account, returning a scoped session that sends
    /// node-accepted transactions as that account.
    pub async fn impersonate(
        &self,
        address: Address,
    ) -> Result<ImpersonationSession<'_, P, T>, TesterError> {
        self.request::<_, Ack>(self.admin_method("impersonateAccount"), (address,)).await?;
        Ok(ImpersonationSession { tester: self, address, closed: AtomicBool::new(false) })
    }

    /// Stop impersonating an account.
    pub async fn stop_impersonating(&self, address: Address) -> Result<(), TesterError> {
        self.request::<_, Ack>(self.admin_method("stopImpersonatingAccount"), (address,))
            .await
            .map(drop)
    }

    /// Enable automatic impersonation of every sender. Anvil only.
    pub async fn enable_auto_impersonate(&self) -> Result<(), TesterError> {
        self.set_auto_impersonate(true).await
    }

    /// Disable automatic impersonation. Anvil only.
    pub async fn disable_auto_impersonate(&self) -> Result<(), TesterError> {
        self.set_auto_impersonate(false).await
    }

    async fn set_auto_impersonate(&self, enabled: bool) -> Result<(), TesterError> {
        self.require_anvil("autoImpersonateAccount")?;
        self.request::<_, Ack>(self.admin_method("autoImpersonateAccount"), (enabled,))
            .await
            .map(drop)
    }

    /// Serialize the node's entire state into an opaque buffer. Anvil only.
    pub async fn dump_state(&self) -> Result<Bytes, TesterError> {
        self.require_anvil("dumpState")?;
        self.request::<_, Bytes>(self.admin_method("dumpState"), ()).await
    }

    /// Load a previously dumped state buffer. Anvil only.
    pub async fn load_state(&self, state: Bytes) -> Result<bool, TesterError> {
        self.require_anvil("loadState")?;
        self.request::<_, bool>(self.admin_method("loadState"), (state,)).await
    }

    /// Remove a transaction from the pool. Anvil only.
    pub async fn drop_transaction(&self, tx_hash: B256) -> Result<Option<B256>, TesterError> {
        self.require_anvil("dropTransaction")?;
        self.request::<_, Option<B256>>(self.admin_method("dropTransaction"), (tx_hash,)).await
    }

    /// Snapshot the current chain state, returning an opaque handle.
    pub async fn snapshot(&self) -> Result<SnapshotId, TesterError> {
        let raw: String = self.request(self.time_method("snapshot"), ()).await?;
        Ok(SnapshotId::new(raw)?)
    }

    /// Revert the chain to a snapshot. Returns whether the node accepted the
    /// snapshot id.
    ///
    /// A successful revert invalidates the given snapshot and every snapshot
    /// taken after it.
    pub async fn revert(&self, snapshot: &SnapshotId) -> Result<bool, TesterError> {
        self.request::<_, bool>(self.time_method("revert"), (snapshot,)).await
    }

    /// Reset the node, optionally re-forking from an upstream endpoint.
    pub async fn reset(&self, forking: Option<Forking>) -> Result<(), TesterError> {
        #[derive(Clone, Serialize)]
        struct ResetParams {
            forking: Forking,
        }

        match forking {
            Some(forking) => self
                .request::<_, Ack>(self.admin_method("reset"), (ResetParams { forking },))
                .await
                .map(drop),
            None => self.request::<_, Ack>(self.admin_method("reset"), ()).await.map(drop),
        }
    }
}

/// A scoped impersonation capability.
///
/// Transactions sent through the session have their `from` overwritten with
/// the impersonated address and are submitted unsigned; the node accepts
/// them while the impersonation is active. [`close`](Self::close) is
/// idempotent; operations after close fail with [`SessionClosed`].
#[derive(Debug)]
pub struct ImpersonationSession<'a, P, T> {
    tester: &'a Tester<P, T>,
    address: Address,
    closed: AtomicBool,
}

impl<P, T> ImpersonationSession<'_, P, T>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// The impersonated address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns `true` if the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), TesterError> {
        if self.is_closed() {
            Err(SessionClosed.into())
        } else {
            Ok(())
        }
    }

    /// Send a transaction as the impersonated account.
    ///
    /// Any `from` on the request is overwritten with the impersonated
    /// address. Returns the transaction hash.
    pub async fn send_transaction(&self, mut req: TransactionRequest) -> Result<B256, TesterError> {
        self.ensure_open()?;
        req.from = Some(self.address);
        self.tester.request("eth_sendTransaction".to_string(), (req,)).await
    }

    /// Stop impersonating and close the session. Idempotent.
    pub async fn close(&self) -> Result<(), TesterError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.tester.stop_impersonating(self.address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_name_construction() {
        let cases = [
            (TestNodeMode::Anvil, "setBalance", "anvil_setBalance"),
            (TestNodeMode::Hardhat, "setBalance", "hardhat_setBalance"),
            (TestNodeMode::Ganache, "setBalance", "evm_setBalance"),
        ];
        for (mode, name, expected) in cases {
            assert_eq!(format!("{}{name}", mode.admin_prefix()), expected);
        }

        // Time and snapshot methods are evm_* everywhere but on Hardhat.
        let cases = [
            (TestNodeMode::Anvil, "snapshot", "evm_snapshot"),
            (TestNodeMode::Ganache, "snapshot", "evm_snapshot"),
            (TestNodeMode::Hardhat, "snapshot", "hardhat_snapshot"),
            (TestNodeMode::Anvil, "increaseTime", "evm_increaseTime"),
            (TestNodeMode::Hardhat, "mine", "hardhat_mine"),
        ];
        for (mode, name, expected) in cases {
            assert_eq!(format!("{}{name}", mode.time_prefix()), expected);
        }
    }
}
