use crate::{BatchRequest, ClientBuilder, RpcCall};
use ferrite_json_rpc::{Id, Request, RpcSend};
use ferrite_transport::{Transport, TransportConnect, TransportError};
use std::{
    borrow::Cow,
    ops::Deref,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tower::layer::util::Identity;

/// A JSON-RPC client.
///
/// [`RpcClient`] is a handle to a shared [`RpcClientInner`]. Cloning is
/// cheap, and all clones allocate request ids from the same counter.
///
/// The client manages a [`Transport`] and a request ID counter. It is used to
/// build [`RpcCall`] and [`BatchRequest`] objects, and delegates transport
/// access to the calls.
///
/// ### Note
///
/// IDs are allocated sequentially, starting at 0, in program order: a request
/// prepared before another on the same task receives a strictly smaller id.
/// Allocated IDs may not be used; there is no guarantee that a prepared
/// [`RpcCall`] will be sent, or that a sent call will receive a response.
#[derive(Debug)]
pub struct RpcClient<T>(Arc<RpcClientInner<T>>);

impl<T> Clone for RpcClient<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for RpcClient<T> {
    type Target = RpcClientInner<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A borrowed reference to an [`RpcClientInner`].
pub type ClientRef<'a, T> = &'a RpcClientInner<T>;

/// A [`Weak`] handle to the client, for breaking reference cycles.
pub type WeakClient<T> = Weak<RpcClientInner<T>>;

impl RpcClient<Identity> {
    /// Create a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder<Identity> {
        ClientBuilder::default()
    }
}

impl<T> RpcClient<T> {
    /// Create a new [`RpcClient`] with the given transport.
    pub fn new(transport: T, is_local: bool) -> Self {
        Self(Arc::new(RpcClientInner::new(transport, is_local)))
    }

    /// Record the pubsub frontend backing the transport. Only possible while
    /// the client is not yet shared.
    #[cfg(feature = "pubsub")]
    pub(crate) fn set_pubsub(&mut self, frontend: ferrite_pubsub::PubSubFrontend) {
        Arc::get_mut(&mut self.0).expect("fresh client is unique").pubsub = Some(frontend);
    }

    /// Connect to a transport via a [`TransportConnect`] implementor.
    pub async fn connect<C>(connect: C) -> Result<Self, TransportError>
    where
        T: Transport,
        C: TransportConnect<Transport = T>,
    {
        ClientBuilder::default().connect(connect).await
    }

    /// Set the default request deadline applied to every call.
    ///
    /// # Panics
    ///
    /// Panics if the client has already been cloned or otherwise shared.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        Arc::get_mut(&mut self.0).expect("cannot configure a shared client").request_timeout =
            timeout;
        self
    }

    /// Get a [`WeakClient`] handle.
    pub fn get_weak(&self) -> WeakClient<T> {
        Arc::downgrade(&self.0)
    }

    /// Get a [`ClientRef`].
    pub fn get_ref(&self) -> ClientRef<'_, T> {
        &self.0
    }
}

impl<T: Transport + Clone> RpcClient<T> {
    /// Create a new [`BatchRequest`] builder.
    #[inline]
    pub fn new_batch(&self) -> BatchRequest<'_, T> {
        BatchRequest::new(&self.0)
    }

    /// Type erase the transport, allowing the client to be used in a generic
    /// context.
    ///
    /// ## Note
    ///
    /// This is for abstracting over `RpcClient<T>` for multiple `T` by
    /// erasing each type. E.g. if you have `RpcClient<Http>` and
    /// `RpcClient<Ws>` you can put both into a
    /// `Vec<RpcClient<BoxTransport>>`.
    pub fn boxed(&self) -> RpcClient<ferrite_transport::BoxTransport> {
        let inner = RpcClientInner {
            transport: self.transport.clone().boxed(),
            #[cfg(feature = "pubsub")]
            pubsub: self.pubsub.clone(),
            is_local: self.is_local,
            id: AtomicU64::new(self.id.load(Ordering::Relaxed)),
            request_timeout: self.request_timeout,
        };
        RpcClient(Arc::new(inner))
    }
}

/// The inner state of an [`RpcClient`].
#[derive(Debug)]
pub struct RpcClientInner<T> {
    /// The underlying transport.
    pub(crate) transport: T,
    /// The pubsub frontend, if the transport is a streaming transport.
    #[cfg(feature = "pubsub")]
    pub(crate) pubsub: Option<ferrite_pubsub::PubSubFrontend>,
    /// `true` if the transport is local.
    pub(crate) is_local: bool,
    /// The next request ID to use.
    pub(crate) id: AtomicU64,
    /// Default deadline applied to every request, if any.
    pub(crate) request_timeout: Option<Duration>,
}

impl<T> RpcClientInner<T> {
    /// Create a new [`RpcClientInner`] with the given transport.
    pub fn new(transport: T, is_local: bool) -> Self {
        Self {
            transport,
            #[cfg(feature = "pubsub")]
            pubsub: None,
            is_local,
            id: AtomicU64::new(0),
            request_timeout: None,
        }
    }

    /// Set the default request deadline. `None` disables deadlines.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The configured default request deadline.
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns a reference to the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// `true` if the client believes the transport is local.
    ///
    /// This can be used to optimize remote API usage, or to change program
    /// behavior on local endpoints. When the client is instantiated by
    /// parsing a URL or other external input, this value is set on a
    /// best-efforts basis and may be incorrect.
    #[inline]
    pub const fn is_local(&self) -> bool {
        self.is_local
    }

    /// Reserve a request ID value. This is used to generate request IDs.
    #[inline]
    fn increment_id(&self) -> u64 {
        self.id.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserve a request ID.
    #[inline]
    pub fn next_id(&self) -> Id {
        Id::Number(self.increment_id())
    }

    /// Build a `Request` with the given method and params.
    ///
    /// This function reserves an ID for the request, however the request is
    /// not sent. To send a request, use [`RpcClientInner::request`] and await
    /// the returned [`RpcCall`].
    pub fn make_request<Params: RpcSend>(
        &self,
        method: impl Into<Cow<'static, str>>,
        params: Params,
    ) -> Request<Params> {
        Request::new(method, self.next_id(), params)
    }
}

#[cfg(feature = "pubsub")]
impl<T> RpcClientInner<T> {
    /// Returns the pubsub frontend, if the transport supports subscriptions.
    ///
    /// This is the capability predicate for streaming features: a client
    /// `can_subscribe` iff this returns `Some`.
    pub const fn pubsub_frontend(&self) -> Option<&ferrite_pubsub::PubSubFrontend> {
        self.pubsub.as_ref()
    }

    /// Returns the pubsub frontend, or a `PubsubUnavailable` error if the
    /// transport does not support subscriptions.
    pub fn expect_pubsub_frontend(
        &self,
    ) -> Result<&ferrite_pubsub::PubSubFrontend, TransportError> {
        self.pubsub.as_ref().ok_or_else(ferrite_transport::TransportErrorKind::pubsub_unavailable)
    }

    /// Get a [`RawSubscription`] for the given local subscription ID.
    ///
    /// [`RawSubscription`]: ferrite_pubsub::RawSubscription
    pub async fn get_raw_subscription(
        &self,
        local_id: alloy_primitives::B256,
    ) -> Result<ferrite_pubsub::RawSubscription, TransportError> {
        self.expect_pubsub_frontend()?.get_raw_subscription(local_id).await
    }

    /// Unsubscribe from the subscription with the given local ID.
    pub fn unsubscribe(&self, local_id: alloy_primitives::B256) -> Result<(), TransportError> {
        self.expect_pubsub_frontend()?.unsubscribe(local_id)
    }

    /// Close the streaming transport, if any. Idempotent; a no-op for
    /// request/response transports.
    pub fn close_pubsub(&self) {
        if let Some(pubsub) = &self.pubsub {
            pubsub.close();
        }
    }
}

impl<T: Transport + Clone> RpcClientInner<T> {
    /// Prepare an [`RpcCall`].
    ///
    /// This function reserves an ID for the request, however the request is
    /// not sent. To send a request, await the returned [`RpcCall`].
    ///
    /// ### Note
    ///
    /// Serialization is done lazily. It will not be performed until the call
    /// is awaited. This means that if a serializer error occurs, it will not
    /// be caught until the call is awaited.
    pub fn request<Params: RpcSend, Resp>(
        &self,
        method: impl Into<Cow<'static, str>>,
        params: Params,
    ) -> RpcCall<T, Params, Resp> {
        let request = self.make_request(method, params);
        let call = RpcCall::new(request, self.transport.clone());
        match self.request_timeout {
            Some(timeout) => call.with_timeout(timeout),
            None => call,
        }
    }
}

#[cfg(feature = "pubsub")]
mod pubsub_impl {
    use super::*;
    use ferrite_pubsub::{PubSubConnect, PubSubFrontend};

    impl RpcClient<PubSubFrontend> {
        /// Connect a pubsub transport, producing an [`RpcClient`] with the
        /// provided connection.
        pub async fn connect_pubsub<C: PubSubConnect>(connect: C) -> Result<Self, TransportError> {
            ClientBuilder::default().pubsub(connect).await
        }

        /// Health counters for the underlying streaming service.
        pub fn stats(&self) -> &ferrite_pubsub::PubSubStats {
            self.transport.stats()
        }
    }
}
