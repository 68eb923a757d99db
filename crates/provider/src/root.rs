use crate::{ClientClosed, Provider};
use ferrite_rpc_client::{ClientRef, RpcClient};
use ferrite_transport::Transport;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// The root provider: an [`RpcClient`] plus provider lifecycle state.
///
/// Cloning is cheap; all clones share the client and the closed flag.
/// Readers constructed from the same client observe a single lifetime: once
/// any handle calls [`close`](Self::close), every operation on every clone
/// fails with [`ClientClosed`].
#[derive(Debug)]
pub struct RootProvider<T> {
    inner: Arc<RootProviderInner<T>>,
}

impl<T> Clone for RootProvider<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

#[derive(Debug)]
struct RootProviderInner<T> {
    client: RpcClient<T>,
    closed: AtomicBool,
}

impl<T> RootProvider<T> {
    /// Create a new root provider around a client.
    pub fn new(client: RpcClient<T>) -> Self {
        Self { inner: Arc::new(RootProviderInner { client, closed: AtomicBool::new(false) }) }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> ClientRef<'_, T> {
        self.inner.client.get_ref()
    }

    /// Returns `true` if the provider has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Close the provider. Idempotent.
    ///
    /// Subsequent operations on any clone fail with [`ClientClosed`]. For
    /// streaming transports, the underlying connection is torn down.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "pubsub")]
            self.inner.client.close_pubsub();
        }
    }

    /// Fail with [`ClientClosed`] if the provider has been closed.
    pub(crate) fn ensure_open(&self) -> Result<(), ClientClosed> {
        if self.is_closed() {
            Err(ClientClosed)
        } else {
            Ok(())
        }
    }
}

impl<T: Transport + Clone> Provider<T> for RootProvider<T> {
    fn root(&self) -> &RootProvider<T> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_transport::mock::{Asserter, MockTransport};

    #[tokio::test]
    async fn close_is_idempotent() {
        let asserter = Asserter::new();
        let provider = RootProvider::new(RpcClient::new(MockTransport::new(asserter), true));
        let clone = provider.clone();

        assert!(!provider.is_closed());
        provider.close();
        provider.close();
        assert!(provider.is_closed());
        // The lifetime is shared across clones.
        assert!(clone.is_closed());
        assert!(clone.ensure_open().is_err());
    }
}
