use crate::{
    ix::PubSubInstruction,
    managers::InFlight,
    service::{ConnState, Shared},
    PubSubStats,
};
use alloy_primitives::B256;
use ferrite_json_rpc::{RequestPacket, Response, ResponsePacket, SerializedRequest};
use ferrite_transport::{
    utils::Spawnable, TransportError, TransportErrorKind, TransportFut,
};
use futures::{future::try_join_all, FutureExt, TryFutureExt};
use serde_json::value::RawValue;
use std::{
    future::Future,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::{
    sync::{broadcast, mpsc, mpsc::error::TrySendError, oneshot},
    time::Instant,
};

/// A `PubSubFrontend` is a [`Transport`] composed of a channel to a running
/// pubsub service.
///
/// Submissions are enqueued into a bounded channel. When the channel is full
/// the submission is rejected with a backpressure error; callers that prefer
/// to wait for capacity opt in via [`send_awaiting_capacity`].
///
/// While the service is reconnecting, and after it has closed, submissions
/// fail fast rather than queueing.
///
/// [`Transport`]: ferrite_transport::Transport
/// [`send_awaiting_capacity`]: PubSubFrontend::send_awaiting_capacity
#[derive(Clone, Debug)]
pub struct PubSubFrontend {
    tx: mpsc::Sender<PubSubInstruction>,
    shared: Arc<Shared>,
}

impl PubSubFrontend {
    /// Create a new frontend.
    pub(crate) const fn new(tx: mpsc::Sender<PubSubInstruction>, shared: Arc<Shared>) -> Self {
        Self { tx, shared }
    }

    /// Health counters for the running service.
    pub fn stats(&self) -> &PubSubStats {
        &self.shared.stats
    }

    /// Returns an error if the service cannot currently accept submissions.
    fn state_err(&self) -> Option<TransportError> {
        match self.shared.state() {
            ConnState::Reconnecting => Some(TransportErrorKind::backend_gone()),
            ConnState::Closed => Some(TransportErrorKind::closed()),
            ConnState::Connecting | ConnState::Connected => None,
        }
    }

    /// Enqueue an instruction without waiting for capacity.
    fn enqueue(&self, ix: PubSubInstruction) -> Result<(), TransportError> {
        // Saturation is evented when the queue drops under 10% remaining.
        let remaining = self.tx.capacity();
        if remaining * 10 < self.tx.max_capacity() {
            self.shared.stats.record_ring_saturation(remaining);
        }

        self.tx.try_send(ix).map_err(|err| match err {
            TrySendError::Full(_) => {
                self.shared.stats.record_backpressure_rejection();
                TransportErrorKind::backpressure_rejected()
            }
            TrySendError::Closed(_) => TransportErrorKind::backend_gone(),
        })
    }

    /// Send a request.
    pub fn send(
        &self,
        req: SerializedRequest,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static {
        let this = self.clone();
        async move {
            if let Some(err) = this.state_err() {
                return Err(err);
            }
            let (in_flight, rx) = InFlight::new(req);
            this.enqueue(PubSubInstruction::Request(in_flight))?;
            rx.await.map_err(|_| TransportErrorKind::backend_gone())?
        }
    }

    /// Send a request, waiting for submission-queue capacity instead of
    /// rejecting when it is full.
    pub fn send_awaiting_capacity(
        &self,
        req: SerializedRequest,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static {
        let this = self.clone();
        async move {
            if let Some(err) = this.state_err() {
                return Err(err);
            }
            let (in_flight, rx) = InFlight::new(req);
            this.tx
                .send(PubSubInstruction::Request(in_flight))
                .await
                .map_err(|_| TransportErrorKind::backend_gone())?;
            rx.await.map_err(|_| TransportErrorKind::backend_gone())?
        }
    }

    /// Send a request that must be answered before `deadline`.
    ///
    /// If the deadline fires first, the pending entry is removed from the
    /// service and the call fails with a timeout error. A response that wins
    /// the race resolves the request normally, and the cancellation becomes a
    /// no-op; a response that loses it is counted as orphaned.
    pub fn send_with_deadline(
        &self,
        req: SerializedRequest,
        deadline: Instant,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static {
        let this = self.clone();
        async move {
            if let Some(err) = this.state_err() {
                return Err(err);
            }
            let id = req.id().clone();
            let (in_flight, rx) = InFlight::new(req);
            this.enqueue(PubSubInstruction::Request(in_flight))?;

            tokio::select! {
                res = rx => res.map_err(|_| TransportErrorKind::backend_gone())?,
                _ = tokio::time::sleep_until(deadline) => {
                    // Best-effort removal of the pending entry. The sink is
                    // dropped with this future either way, so a late response
                    // cannot resolve anything.
                    let _ = this.tx.try_send(PubSubInstruction::Cancel(id));
                    Err(TransportErrorKind::request_timeout())
                }
            }
        }
    }

    /// Send a packet of requests, by breaking it up into individual requests.
    ///
    /// Once all responses are received, we return a single response packet.
    pub fn send_packet(&self, req: RequestPacket) -> TransportFut<'static> {
        match req {
            RequestPacket::Single(req) => self.send(req).map_ok(ResponsePacket::Single).boxed(),
            RequestPacket::Batch(reqs) => try_join_all(reqs.into_iter().map(|req| self.send(req)))
                .map_ok(ResponsePacket::Batch)
                .boxed(),
        }
    }

    /// Get the notification receiver for a local subscription ID.
    pub fn get_subscription(
        &self,
        local_id: B256,
    ) -> impl Future<Output = Result<broadcast::Receiver<Box<RawValue>>, TransportError>> + Send + 'static
    {
        let backend_tx = self.tx.clone();
        async move {
            let (tx, rx) = oneshot::channel();
            backend_tx
                .send(PubSubInstruction::GetSub(local_id, tx))
                .await
                .map_err(|_| TransportErrorKind::backend_gone())?;
            rx.await.map_err(|_| TransportErrorKind::backend_gone())
        }
    }

    /// Get a [`RawSubscription`] handle for a local subscription ID.
    ///
    /// [`RawSubscription`]: crate::RawSubscription
    pub fn get_raw_subscription(
        &self,
        local_id: B256,
    ) -> impl Future<Output = Result<crate::RawSubscription, TransportError>> + Send + 'static {
        let fut = self.get_subscription(local_id);
        async move { Ok(crate::RawSubscription { rx: fut.await?, local_id }) }
    }

    /// Unsubscribe from a subscription.
    ///
    /// The local sink is released regardless of whether the server
    /// acknowledges the unsubscribe.
    pub fn unsubscribe(&self, local_id: B256) -> Result<(), TransportError> {
        self.enqueue(PubSubInstruction::Unsubscribe(local_id))
    }

    /// Close the service. Idempotent.
    ///
    /// Every pending request is completed with a closed-transport error, the
    /// subscription map is emptied, and the connection is torn down.
    /// Submissions racing with the close either complete normally or fail
    /// with a closed/unavailable error; none hang.
    pub fn close(&self) {
        if self.shared.set_closed() {
            if let Err(TrySendError::Full(ix)) = self.tx.try_send(PubSubInstruction::Close) {
                // Queue is saturated; deliver the close behind the queued
                // submissions, which the service will fail on shutdown.
                let tx = self.tx.clone();
                async move {
                    let _ = tx.send(ix).await;
                }
                .spawn_task();
            }
        }
    }

    /// Returns `true` if the service has not been closed.
    pub fn is_open(&self) -> bool {
        self.shared.state() != ConnState::Closed && !self.tx.is_closed()
    }
}

impl tower::Service<RequestPacket> for PubSubFrontend {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        (&*self).poll_ready(cx)
    }

    #[inline]
    fn call(&mut self, req: RequestPacket) -> Self::Future {
        (&*self).call(req)
    }
}

impl tower::Service<RequestPacket> for &PubSubFrontend {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    #[inline]
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let result = if let Some(err) = self.state_err() {
            Err(err)
        } else if self.tx.is_closed() {
            Err(TransportErrorKind::backend_gone())
        } else {
            Ok(())
        };
        Poll::Ready(result)
    }

    #[inline]
    fn call(&mut self, req: RequestPacket) -> Self::Future {
        self.send_packet(req)
    }
}
