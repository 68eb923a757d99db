use crate::{Provider, RootProvider, TxError};
use alloy_primitives::B256;
use ferrite_rpc_types::TransactionReceipt;
use ferrite_transport::Transport;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default interval between receipt polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A handle to a submitted transaction, for awaiting its receipt.
///
/// Polls `eth_getTransactionReceipt` at a configurable interval against a
/// monotonic deadline. Dropping the builder abandons the wait without
/// affecting the transaction.
#[derive(Debug)]
#[must_use = "this builder does nothing unless `get_receipt` is awaited"]
pub struct PendingTransactionBuilder<T> {
    root: RootProvider<T>,
    tx_hash: B256,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl<T: Transport + Clone> PendingTransactionBuilder<T> {
    /// Create a new builder for the given transaction hash.
    pub fn new(root: RootProvider<T>, tx_hash: B256) -> Self {
        Self { root, tx_hash, timeout: None, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// The hash of the submitted transaction.
    pub const fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Bound the wait. Without a timeout, polling continues until the
    /// receipt appears or the caller drops the future.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the poll interval.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until the transaction is mined, yielding its receipt.
    ///
    /// Fails with [`TxError::ReceiptTimeout`] if the deadline elapses first.
    pub async fn get_receipt(self) -> Result<TransactionReceipt, TxError> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        debug!(tx_hash = %self.tx_hash, timeout = ?self.timeout, "[TX-WAIT] awaiting receipt");

        loop {
            if let Some(receipt) = self.root.get_transaction_receipt(self.tx_hash).await? {
                if receipt.is_success() {
                    debug!(tx_hash = %self.tx_hash, block = ?receipt.block_number, "[TX-RECEIPT] mined");
                } else {
                    debug!(tx_hash = %self.tx_hash, "[TX-REVERT] mined but reverted");
                }
                return Ok(receipt);
            }

            let sleep_until = Instant::now() + self.poll_interval;
            if let Some(deadline) = deadline {
                if sleep_until > deadline {
                    return Err(TxError::ReceiptTimeout {
                        timeout: self.timeout.unwrap_or_default(),
                    });
                }
            }
            tokio::time::sleep_until(sleep_until).await;
        }
    }
}
