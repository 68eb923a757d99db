use crate::{
    handle::ConnectionHandle,
    ix::PubSubInstruction,
    managers::{Fulfillment, InFlight, RequestManager, SubscriptionManager},
    stats::PubSubStats,
    PubSubConnect, PubSubFrontend, MAX_PENDING_REQUESTS, MAX_RECONNECT_ATTEMPTS, RING_BUFFER_SIZE,
};
use alloy_primitives::{B256, U256};
use ferrite_json_rpc::{Id, PubSubItem, Response, ResponsePayload};
use ferrite_transport::{
    utils::{to_json_raw_value, Spawnable},
    TransportError, TransportErrorKind,
};
use serde_json::value::RawValue;
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, trace};

/// Connection lifecycle of a pubsub service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ConnState {
    /// The initial connection is being established.
    Connecting = 0,
    /// The connection is up and requests flow.
    Connected = 1,
    /// The connection was lost and the service is attempting to re-establish
    /// it. New submissions fail fast.
    Reconnecting = 2,
    /// Terminal: the user closed the service, or reconnection was exhausted.
    Closed = 3,
}

impl ConnState {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Connected,
            2 => Self::Reconnecting,
            _ => Self::Closed,
        }
    }
}

/// State and statistics shared between the service task and its frontends.
#[derive(Debug)]
pub(crate) struct Shared {
    state: AtomicU8,
    pub(crate) stats: PubSubStats,
}

impl Shared {
    fn new() -> Self {
        Self { state: AtomicU8::new(ConnState::Connecting as u8), stats: PubSubStats::default() }
    }

    pub(crate) fn state(&self) -> ConnState {
        ConnState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Transition to `Closed`. Returns `false` if already closed.
    pub(crate) fn set_closed(&self) -> bool {
        self.state.swap(ConnState::Closed as u8, Ordering::AcqRel) != ConnState::Closed as u8
    }
}

/// Limits applied to a running pubsub service.
///
/// The defaults are the crate-level constants; tests and unusual deployments
/// may override them.
#[derive(Clone, Copy, Debug)]
pub struct ServiceConfig {
    /// Capacity of the frontend-to-service submission queue.
    pub ring_buffer_size: usize,
    /// Maximum number of requests awaiting responses at once.
    pub max_pending_requests: usize,
    /// Consecutive failed reconnect attempts before closing permanently.
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect attempt; doubles per attempt.
    pub reconnect_base: Duration,
    /// Cap on the reconnect delay.
    pub reconnect_max: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: RING_BUFFER_SIZE,
            max_pending_requests: MAX_PENDING_REQUESTS,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(32),
        }
    }
}

impl ServiceConfig {
    /// Delay before reconnect attempt `attempt` (1-based):
    /// `min(base * 2^(attempt - 1), max)`.
    fn reconnect_backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.reconnect_base.saturating_mul(1u32 << exp).min(self.reconnect_max)
    }
}

/// The service contains the backend handle, the request and subscription
/// managers, and the configuration details required to reconnect.
#[derive(Debug)]
pub(crate) struct PubSubService<T> {
    /// The backend handle.
    pub(crate) handle: ConnectionHandle,

    /// The configuration details required to reconnect.
    pub(crate) connector: T,

    /// The inbound instructions.
    pub(crate) reqs: mpsc::Receiver<PubSubInstruction>,

    /// The subscription manager.
    pub(crate) subs: SubscriptionManager,

    /// The request manager.
    pub(crate) in_flights: RequestManager,

    /// State and counters shared with the frontends.
    pub(crate) shared: Arc<Shared>,

    /// Service limits.
    pub(crate) config: ServiceConfig,
}

impl<T> PubSubService<T>
where
    T: PubSubConnect,
{
    /// Create a new service from a connector, spawning its task.
    pub(crate) async fn connect(
        connector: T,
        config: ServiceConfig,
    ) -> Result<PubSubFrontend, TransportError> {
        let shared = Arc::new(Shared::new());
        let handle = connector.connect().await?;
        shared.set_state(ConnState::Connected);

        let (tx, reqs) = mpsc::channel(config.ring_buffer_size.max(1));
        let this = Self {
            handle,
            connector,
            reqs,
            subs: Default::default(),
            in_flights: Default::default(),
            shared: shared.clone(),
            config,
        };
        this.spawn();
        Ok(PubSubFrontend::new(tx, shared))
    }

    /// Reconnect after connection loss.
    ///
    /// Pending requests are failed immediately: reconnection is transparent
    /// to future calls, never to in-flight ones. Server-side subscription ids
    /// are dropped and NOT re-established.
    async fn reconnect(&mut self) -> Result<(), TransportError> {
        self.shared.set_state(ConnState::Reconnecting);

        self.in_flights.fail_all(TransportErrorKind::backend_gone);
        let lost = self.subs.drop_server_ids();
        self.shared.stats.record_lost_subscriptions(lost as u64);

        for attempt in 1..=self.config.max_reconnect_attempts {
            let delay = self.config.reconnect_backoff(attempt);
            debug!(attempt, ?delay, "scheduling reconnect attempt");
            tokio::time::sleep(delay).await;

            match self.connector.try_reconnect().await {
                Ok(mut handle) => {
                    std::mem::swap(&mut self.handle, &mut handle);
                    handle.shutdown();
                    self.shared.set_state(ConnState::Connected);
                    self.shared.stats.record_reconnect();
                    debug!(attempt, "reconnected");
                    return Ok(());
                }
                Err(err) => {
                    error!(%err, attempt, "reconnect attempt failed");
                }
            }
        }

        self.shared.set_closed();
        Err(TransportErrorKind::backend_gone())
    }

    /// Dispatch a request to the socket.
    fn dispatch_request(&mut self, brv: Box<RawValue>) -> Result<(), TransportError> {
        self.handle.to_socket.send(brv).map(drop).map_err(|_| TransportErrorKind::backend_gone())
    }

    /// Service a request instruction.
    fn service_request(&mut self, in_flight: InFlight) -> Result<(), TransportError> {
        if self.in_flights.len() >= self.config.max_pending_requests {
            self.shared.stats.record_backpressure_rejection();
            in_flight.fail(TransportErrorKind::backpressure_rejected());
            return Ok(());
        }

        let brv = in_flight.request().serialized().to_owned();
        match self.dispatch_request(brv) {
            Ok(()) => {
                self.in_flights.insert(in_flight);
                Ok(())
            }
            Err(err) => {
                in_flight.fail(TransportErrorKind::backend_gone());
                Err(err)
            }
        }
    }

    /// Service a cancel instruction. Removing the entry is atomic with
    /// respect to response handling: whichever happens first consumes the
    /// in-flight entry, and the loser is a no-op.
    fn service_cancel(&mut self, id: &Id) {
        if self.in_flights.remove(id).is_some() {
            trace!(%id, "cancelled in-flight request");
        }
    }

    /// Service a `GetSub` instruction.
    ///
    /// If the subscription exists, the waiter is sent a notification
    /// receiver. If it does not, `tx` is dropped, which notifies the waiter.
    fn service_get_sub(
        &mut self,
        local_id: B256,
        tx: oneshot::Sender<broadcast::Receiver<Box<RawValue>>>,
    ) {
        if let Some(rx) = self.subs.get_rx(local_id) {
            let _ = tx.send(rx);
        }
    }

    /// Service an unsubscribe instruction.
    ///
    /// The local sink is removed unconditionally. The wire unsubscribe is
    /// dispatched with a null id and its acknowledgement is not awaited.
    fn service_unsubscribe(&mut self, local_id: B256) -> Result<(), TransportError> {
        let server_id = self.subs.server_id_for(&local_id);
        self.subs.remove_sub(local_id);

        if let Some(server_id) = server_id {
            let req = ferrite_json_rpc::Request::new("eth_unsubscribe", Id::None, [server_id]);
            let brv = req.serialize().map_err(TransportError::ser_err)?.take_request();
            self.dispatch_request(brv)?;
        }
        Ok(())
    }

    /// Service an instruction.
    fn service_ix(&mut self, ix: PubSubInstruction) -> Result<(), TransportError> {
        trace!(?ix, "servicing instruction");
        match ix {
            PubSubInstruction::Request(in_flight) => self.service_request(in_flight),
            PubSubInstruction::Cancel(id) => {
                self.service_cancel(&id);
                Ok(())
            }
            PubSubInstruction::GetSub(local_id, tx) => {
                self.service_get_sub(local_id, tx);
                Ok(())
            }
            PubSubInstruction::Unsubscribe(local_id) => self.service_unsubscribe(local_id),
            PubSubInstruction::Close => unreachable!("close handled by the service loop"),
        }
    }

    /// Handle an item from the backend.
    fn handle_item(&mut self, item: PubSubItem) -> Result<(), TransportError> {
        match item {
            PubSubItem::Response(resp) => self.handle_response(resp),
            PubSubItem::Notification(notification) => {
                if !self.subs.notify(notification) {
                    trace!("notification for unknown subscription id dropped");
                }
                Ok(())
            }
        }
    }

    /// Route a response to the pending request with the matching id.
    ///
    /// Responses that match nothing are counted as orphans with a reason and
    /// never tear the service down.
    fn handle_response(&mut self, resp: Response) -> Result<(), TransportError> {
        match &resp.id {
            Id::Number(_) => match self.in_flights.handle_response(resp) {
                Ok(Fulfillment::Subscribed { server_id, in_flight }) => {
                    self.handle_sub_response(in_flight, server_id)
                }
                Ok(Fulfillment::Completed) => Ok(()),
                Err(_) => {
                    self.shared.stats.record_orphaned_response("no pending request");
                    Ok(())
                }
            },
            Id::String(_) => {
                self.shared.stats.record_orphaned_response("unexpected id type");
                Ok(())
            }
            Id::None => {
                self.shared.stats.record_orphaned_response("unparseable id");
                Ok(())
            }
        }
    }

    /// Record the subscription and reply to the caller with the local id.
    ///
    /// The caller is told the local (params-hash) id rather than the
    /// server-assigned one, so that the handle it holds stays meaningful
    /// across reconnects.
    fn handle_sub_response(
        &mut self,
        in_flight: InFlight,
        server_id: U256,
    ) -> Result<(), TransportError> {
        let request = in_flight.request.clone();
        let id = request.id().clone();

        let local_id = self.subs.upsert(request, server_id);
        let ser_alias = to_json_raw_value(&local_id)?;

        // We don't care if the receiver is gone.
        let _ = in_flight
            .tx
            .send(Ok(Response { id, payload: ResponsePayload::Success(ser_alias) }));
        Ok(())
    }

    /// Tear down: fail all pendings, clear the subscription map.
    fn shutdown(&mut self) {
        self.shared.set_closed();
        self.in_flights.fail_all(TransportErrorKind::closed);
        self.subs.clear();
    }

    /// Spawn the service task.
    pub(crate) fn spawn(mut self) {
        let fut = async move {
            let result: Result<(), TransportError> = loop {
                // We bias the loop so that we always handle new messages
                // before reconnecting, and always reconnect before
                // dispatching new requests.
                tokio::select! {
                    biased;

                    item_opt = self.handle.from_socket.recv() => {
                        if let Some(item) = item_opt {
                            if let Err(e) = self.handle_item(item) {
                                break Err(e)
                            }
                        } else if let Err(e) = self.reconnect().await {
                            break Err(e)
                        }
                    }

                    _ = &mut self.handle.error => {
                        error!("pubsub service backend error");
                        if let Err(e) = self.reconnect().await {
                            break Err(e)
                        }
                    }

                    req_opt = self.reqs.recv() => {
                        match req_opt {
                            Some(PubSubInstruction::Close) => {
                                debug!("pubsub service received close instruction");
                                break Ok(())
                            }
                            Some(req) => {
                                if self.service_ix(req).is_err() {
                                    // The socket died under us; the failed
                                    // instruction's sink has been notified.
                                    if let Err(e) = self.reconnect().await {
                                        break Err(e)
                                    }
                                }
                            }
                            None => {
                                debug!("pubsub service request channel closed, shutting down");
                                break Ok(())
                            }
                        }
                    }
                }
            };

            self.shutdown();

            if let Err(err) = result {
                error!(%err, "pubsub service exited with error");
            }
        };
        fut.spawn_task();
    }
}
