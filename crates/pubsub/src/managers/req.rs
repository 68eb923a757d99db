use crate::managers::{Fulfillment, InFlight};
use alloy_primitives::map::HashMap;
use ferrite_json_rpc::{Id, Response};
use ferrite_transport::TransportError;

/// Manages in-flight requests by id.
#[derive(Debug, Default)]
pub(crate) struct RequestManager {
    reqs: HashMap<Id, InFlight>,
}

impl RequestManager {
    /// Get the number of in-flight requests.
    pub(crate) fn len(&self) -> usize {
        self.reqs.len()
    }

    /// Insert a new in-flight request.
    pub(crate) fn insert(&mut self, in_flight: InFlight) {
        self.reqs.insert(in_flight.request.id().clone(), in_flight);
    }

    /// Remove an in-flight request by id, if present.
    pub(crate) fn remove(&mut self, id: &Id) -> Option<InFlight> {
        self.reqs.remove(id)
    }

    /// Hand a response to the in-flight request with the matching id.
    ///
    /// Returns `Err(response)` if no request with the response's id is
    /// pending, leaving the caller to account for the orphan. Otherwise the
    /// entry is consumed and the [`Fulfillment`] says whether a subscription
    /// start needs follow-up.
    pub(crate) fn handle_response(&mut self, resp: Response) -> Result<Fulfillment, Response> {
        match self.reqs.remove(&resp.id) {
            Some(in_flight) => Ok(in_flight.complete(resp)),
            None => Err(resp),
        }
    }

    /// Fail all in-flight requests with the given error factory.
    pub(crate) fn fail_all(&mut self, err: impl Fn() -> TransportError) {
        for (_, in_flight) in self.reqs.drain() {
            in_flight.fail(err());
        }
    }
}
