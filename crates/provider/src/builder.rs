use crate::RootProvider;
use ferrite_rpc_client::ClientBuilder;
use ferrite_transport::{RetryBackoffLayer, Transport, TransportConnect, TransportError};
use std::time::Duration;
use tower::{
    layer::util::{Identity, Stack},
    Layer,
};

/// A builder for [`RootProvider`]s.
///
/// Stacks transport middleware (retries first, then anything added via
/// [`layer`](Self::layer)), applies client-wide options such as the request
/// deadline, and connects a transport.
#[derive(Debug)]
pub struct ProviderBuilder<L = Identity> {
    client: ClientBuilder<L>,
    request_timeout: Option<Duration>,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderBuilder {
    /// Create a new builder with no middleware.
    pub fn new() -> Self {
        Self { client: ClientBuilder::default(), request_timeout: None }
    }
}

impl<L> ProviderBuilder<L> {
    /// Add a middleware layer to the transport stack.
    pub fn layer<M>(self, layer: M) -> ProviderBuilder<Stack<M, L>> {
        ProviderBuilder { client: self.client.layer(layer), request_timeout: self.request_timeout }
    }

    /// Retry transient failures up to `max_attempts` times per request,
    /// with the default fault classifier and backoff schedule.
    pub fn with_retries(self, max_attempts: u32) -> ProviderBuilder<Stack<RetryBackoffLayer, L>> {
        self.layer(RetryBackoffLayer::new(max_attempts))
    }

    /// Apply a deadline to every request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Connect an HTTP transport.
    #[cfg(feature = "reqwest")]
    pub fn connect_http(self, url: url::Url) -> RootProvider<L::Service>
    where
        L: Layer<ferrite_rpc_client::ReqwestTransport>,
        L::Service: Transport + Clone,
    {
        let Self { client, request_timeout } = self;
        finish(request_timeout, client.http(url))
    }

    /// Connect a WebSocket transport.
    #[cfg(feature = "ws")]
    pub async fn connect_ws(
        self,
        connect: ferrite_rpc_client::WsConnect,
    ) -> Result<RootProvider<L::Service>, TransportError>
    where
        L: Layer<ferrite_pubsub::PubSubFrontend>,
        L::Service: Transport + Clone,
    {
        let Self { client, request_timeout } = self;
        Ok(finish(request_timeout, client.ws(connect).await?))
    }

    /// Connect any pubsub transport.
    #[cfg(feature = "pubsub")]
    pub async fn connect_pubsub<C>(
        self,
        connect: C,
    ) -> Result<RootProvider<L::Service>, TransportError>
    where
        C: ferrite_pubsub::PubSubConnect,
        L: Layer<ferrite_pubsub::PubSubFrontend>,
        L::Service: Transport + Clone,
    {
        let Self { client, request_timeout } = self;
        Ok(finish(request_timeout, client.pubsub(connect).await?))
    }

    /// Connect via a [`TransportConnect`] implementor.
    pub async fn connect<C>(self, connect: C) -> Result<RootProvider<L::Service>, TransportError>
    where
        C: TransportConnect,
        L: Layer<C::Transport>,
        L::Service: Transport + Clone,
    {
        let Self { client, request_timeout } = self;
        Ok(finish(request_timeout, client.connect(connect).await?))
    }

    /// Wire the provider to a mocked transport for tests.
    pub fn connect_mocked_client(
        self,
        asserter: ferrite_transport::mock::Asserter,
    ) -> RootProvider<L::Service>
    where
        L: Layer<ferrite_transport::mock::MockTransport>,
        L::Service: Transport + Clone,
    {
        let Self { client, request_timeout } = self;
        let client = client.transport(ferrite_transport::mock::MockTransport::new(asserter), true);
        finish(request_timeout, client)
    }
}

/// Apply client-wide options and wrap into a root provider.
fn finish<T: Transport + Clone>(
    request_timeout: Option<Duration>,
    client: ferrite_rpc_client::RpcClient<T>,
) -> RootProvider<T> {
    let client = match request_timeout {
        Some(timeout) => client.with_request_timeout(Some(timeout)),
        None => client,
    };
    RootProvider::new(client)
}
