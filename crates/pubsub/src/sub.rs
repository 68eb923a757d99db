use alloy_primitives::B256;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::panic::AssertUnwindSafe;
use tokio::sync::broadcast;

/// A `RawSubscription` is a feed of notifications from the server, identified
/// by a local ID.
///
/// This type is mostly a wrapper around [`broadcast::Receiver`], and exposes
/// the same methods. Dropping it does NOT unsubscribe from the server; use
/// [`PubSubFrontend::unsubscribe`] for that.
///
/// [`PubSubFrontend::unsubscribe`]: crate::PubSubFrontend::unsubscribe
#[derive(Debug)]
pub struct RawSubscription {
    /// The channel via which notifications are received.
    pub(crate) rx: broadcast::Receiver<Box<RawValue>>,
    /// The local ID of the subscription.
    pub(crate) local_id: B256,
}

impl RawSubscription {
    /// Get the local ID of the subscription.
    pub const fn local_id(&self) -> B256 {
        self.local_id
    }

    /// Wrapper for [`blocking_recv`]. Block the current thread until a
    /// message is available.
    ///
    /// [`blocking_recv`]: broadcast::Receiver::blocking_recv
    pub fn blocking_recv(&mut self) -> Result<Box<RawValue>, broadcast::error::RecvError> {
        self.rx.blocking_recv()
    }

    /// Returns `true` if the broadcast channel is empty (i.e. there are
    /// currently no notifications to receive).
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Returns the number of messages in the broadcast channel that this
    /// receiver has yet to receive.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Wrapper for [`recv`]. Await an item from the channel.
    ///
    /// [`recv`]: broadcast::Receiver::recv
    pub async fn recv(&mut self) -> Result<Box<RawValue>, broadcast::error::RecvError> {
        self.rx.recv().await
    }

    /// Wrapper for [`resubscribe`]. Create a new subscription handle,
    /// starting from the current tail element.
    ///
    /// [`resubscribe`]: broadcast::Receiver::resubscribe
    pub fn resubscribe(&self) -> Self {
        Self { rx: self.rx.resubscribe(), local_id: self.local_id }
    }

    /// Wrapper for [`try_recv`]. Attempt to receive a message from the
    /// channel without awaiting.
    ///
    /// [`try_recv`]: broadcast::Receiver::try_recv
    pub fn try_recv(&mut self) -> Result<Box<RawValue>, broadcast::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Drive `sink` with every notification, on a task spawned onto the
    /// given runtime handle.
    ///
    /// This is the escape hatch for callback-style consumers: the sink runs
    /// on the caller-chosen executor, never on the connection's I/O task. A
    /// panicking sink is caught and reported without affecting the
    /// connection; delivery to that sink then stops.
    pub fn attach_sink<F>(
        self,
        executor: &tokio::runtime::Handle,
        mut sink: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: FnMut(Box<RawValue>) + Send + 'static,
    {
        let Self { mut rx, local_id } = self;
        executor.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(item) => {
                        let result =
                            std::panic::catch_unwind(AssertUnwindSafe(|| sink(item)));
                        if result.is_err() {
                            tracing::error!(%local_id, "subscription sink panicked");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%local_id, skipped, "subscription sink lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// An item in a typed [`Subscription`]. This is either the expected type, or
/// some serialized value of another type.
#[derive(Debug)]
pub enum SubscriptionItem<T> {
    /// The expected item.
    Item(T),
    /// Some other value.
    Other(Box<RawValue>),
}

impl<T: DeserializeOwned> From<Box<RawValue>> for SubscriptionItem<T> {
    fn from(value: Box<RawValue>) -> Self {
        serde_json::from_str(value.get()).map_or(Self::Other(value), Self::Item)
    }
}

/// A `Subscription` is a feed of notifications from the server of a specific
/// type `T`, identified by a local ID.
///
/// For flexibility, we expose three different APIs:
/// - [`recv`]: fails on deserialization errors.
/// - [`recv_any`]: yields a [`SubscriptionItem`], never failing on
///   unexpected payload shapes.
/// - The underlying [`RawSubscription`], via [`into_raw`].
///
/// [`recv`]: Subscription::recv
/// [`recv_any`]: Subscription::recv_any
/// [`into_raw`]: Subscription::into_raw
#[derive(Debug)]
pub struct Subscription<T> {
    inner: RawSubscription,
    _pd: std::marker::PhantomData<T>,
}

impl<T> From<RawSubscription> for Subscription<T> {
    fn from(inner: RawSubscription) -> Self {
        Self { inner, _pd: std::marker::PhantomData }
    }
}

impl<T> Subscription<T> {
    /// Get the local ID of the subscription.
    pub const fn local_id(&self) -> B256 {
        self.inner.local_id()
    }

    /// Convert the subscription into its inner [`RawSubscription`].
    pub fn into_raw(self) -> RawSubscription {
        self.inner
    }

    /// Get a reference to the inner subscription.
    pub const fn inner(&self) -> &RawSubscription {
        &self.inner
    }

    /// Returns `true` if the broadcast channel is empty (i.e. there are
    /// currently no notifications to receive).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of messages in the broadcast channel that this
    /// receiver has yet to receive.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Wrapper for [`resubscribe`]. Create a new `Subscription`, starting
    /// from the current tail element.
    ///
    /// [`resubscribe`]: broadcast::Receiver::resubscribe
    pub fn resubscribe(&self) -> Self {
        self.inner.resubscribe().into()
    }
}

impl<T: DeserializeOwned> Subscription<T> {
    /// Await the next item, deserializing it into `T`. Fails if the payload
    /// cannot be deserialized.
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        loop {
            match self.recv_any().await? {
                SubscriptionItem::Item(item) => return Ok(item),
                SubscriptionItem::Other(other) => {
                    return Err(RecvError::UnexpectedPayload(other));
                }
            }
        }
    }

    /// Await the next item, yielding it as a [`SubscriptionItem`].
    pub async fn recv_any(&mut self) -> Result<SubscriptionItem<T>, RecvError> {
        Ok(self.inner.recv().await?.into())
    }

    /// Attempt to receive a message from the channel without awaiting.
    pub fn try_recv(&mut self) -> Result<SubscriptionItem<T>, broadcast::error::TryRecvError> {
        self.inner.try_recv().map(Into::into)
    }
}

/// Error receiving an item from a typed [`Subscription`].
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    /// The notification channel closed or lagged.
    #[error(transparent)]
    Channel(#[from] broadcast::error::RecvError),
    /// The payload did not deserialize into the expected type.
    #[error("unexpected notification payload: {}", .0.get())]
    UnexpectedPayload(Box<RawValue>),
}
