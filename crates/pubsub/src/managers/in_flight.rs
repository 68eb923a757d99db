use alloy_primitives::U256;
use ferrite_json_rpc::{Response, ResponsePayload, SerializedRequest};
use ferrite_transport::TransportError;
use tokio::sync::oneshot;

/// What became of an in-flight request once its response arrived.
pub(crate) enum Fulfillment {
    /// The caller has been answered; nothing is left to do.
    Completed,
    /// The request was a successful subscription start. The caller has NOT
    /// been answered yet: the service records the server-assigned id first,
    /// then replies with the connection-independent local id.
    Subscribed {
        /// The id the server assigned to the subscription.
        server_id: U256,
        /// The request, still holding the caller's sink.
        in_flight: InFlight,
    },
}

/// A request that has been written to the connection and is awaiting its
/// response.
///
/// Pairs the serialized frame with the oneshot sink the caller is parked on.
/// Dropping an `InFlight` without completing it closes the sink, which the
/// caller observes as a gone backend.
pub(crate) struct InFlight {
    /// The serialized request.
    pub(crate) request: SerializedRequest,

    /// The caller's sink.
    pub(crate) tx: oneshot::Sender<Result<Response, TransportError>>,
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("method", &self.request.method())
            .field("id", self.request.id())
            .field("caller_gone", &self.tx.is_closed())
            .finish()
    }
}

impl InFlight {
    /// Pair a serialized request with a fresh response channel, returning the
    /// receiving half for the caller.
    pub(crate) fn new(
        request: SerializedRequest,
    ) -> (Self, oneshot::Receiver<Result<Response, TransportError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { request, tx }, rx)
    }

    /// The serialized request, for writing to the connection.
    pub(crate) const fn request(&self) -> &SerializedRequest {
        &self.request
    }

    /// Route the response into the caller's sink, consuming the entry.
    ///
    /// Subscription starts are intercepted instead of answered: their success
    /// payload is the server-assigned id, which the subscription manager must
    /// learn before the caller gets a (local) id back. Detection goes through
    /// [`SerializedRequest::is_subscription`], so non-standard subscription
    /// methods flagged by the client participate as well.
    pub(crate) fn complete(self, resp: Response) -> Fulfillment {
        if self.request.is_subscription() {
            if let ResponsePayload::Success(val) = &resp.payload {
                return match serde_json::from_str::<U256>(val.get()) {
                    Ok(server_id) => Fulfillment::Subscribed { server_id, in_flight: self },
                    Err(err) => {
                        let text = val.get().to_owned();
                        self.fail(TransportError::deser_err(err, text));
                        Fulfillment::Completed
                    }
                };
            }
        }

        let _ = self.tx.send(Ok(resp));
        Fulfillment::Completed
    }

    /// Fail the request with an error, consuming the entry. A caller that
    /// already lost interest is not an error.
    pub(crate) fn fail(self, err: TransportError) {
        let _ = self.tx.send(Err(err));
    }
}
