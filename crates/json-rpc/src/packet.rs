use crate::{ErrorPayload, Id, Response, SerializedRequest};
use alloy_primitives::map::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A [`RequestPacket`] is a [`SerializedRequest`] or a batch of serialized
/// requests.
#[derive(Clone, Debug)]
pub enum RequestPacket {
    /// A single request.
    Single(SerializedRequest),
    /// A batch of requests.
    Batch(Vec<SerializedRequest>),
}

impl FromIterator<SerializedRequest> for RequestPacket {
    fn from_iter<T: IntoIterator<Item = SerializedRequest>>(iter: T) -> Self {
        Self::Batch(iter.into_iter().collect())
    }
}

impl From<SerializedRequest> for RequestPacket {
    fn from(req: SerializedRequest) -> Self {
        Self::Single(req)
    }
}

impl Serialize for RequestPacket {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(single) => single.serialize(serializer),
            Self::Batch(batch) => batch.serialize(serializer),
        }
    }
}

impl RequestPacket {
    /// Create a new empty packet with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::Batch(Vec::with_capacity(capacity))
    }

    /// Serialize the packet as a boxed [`RawValue`].
    pub fn serialize(self) -> serde_json::Result<Box<RawValue>> {
        match self {
            Self::Single(single) => Ok(single.take_request()),
            Self::Batch(batch) => serde_json::value::to_raw_value(&batch),
        }
    }

    /// Get the request IDs of all subscription requests in the packet.
    pub fn subscription_request_ids(&self) -> HashSet<&Id> {
        self.requests().iter().filter(|req| req.is_subscription()).map(|req| req.id()).collect()
    }

    /// Get the number of requests in the packet.
    pub const fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(batch) => batch.len(),
        }
    }

    /// Check if the packet is empty.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a request into the packet.
    pub fn push(&mut self, req: SerializedRequest) {
        match self {
            Self::Batch(batch) => batch.push(req),
            Self::Single(_) => {
                let old = std::mem::replace(self, Self::Batch(Vec::with_capacity(10)));
                if let Self::Single(single) = old {
                    self.push(single);
                }
                self.push(req);
            }
        }
    }

    /// Returns all [`SerializedRequest`]s in the packet.
    pub const fn requests(&self) -> &[SerializedRequest] {
        match self {
            Self::Single(req) => std::slice::from_ref(req),
            Self::Batch(req) => req.as_slice(),
        }
    }

    /// Returns an iterator over the requests' method names.
    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.requests().iter().map(|req| req.method())
    }
}

/// A [`ResponsePacket`] is a [`Response`] or a batch of responses.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponsePacket<Payload = Box<RawValue>, ErrData = Box<RawValue>> {
    /// A single response.
    Single(Response<Payload, ErrData>),
    /// A batch of responses.
    Batch(Vec<Response<Payload, ErrData>>),
}

impl<Payload, ErrData> FromIterator<Response<Payload, ErrData>>
    for ResponsePacket<Payload, ErrData>
{
    fn from_iter<T: IntoIterator<Item = Response<Payload, ErrData>>>(iter: T) -> Self {
        Self::Batch(iter.into_iter().collect())
    }
}

impl<Payload, ErrData> From<Response<Payload, ErrData>> for ResponsePacket<Payload, ErrData> {
    fn from(value: Response<Payload, ErrData>) -> Self {
        Self::Single(value)
    }
}

impl<Payload, ErrData> ResponsePacket<Payload, ErrData> {
    /// Returns `true` if the packet is an error response, or if any response
    /// in a batch is an error response.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Single(single) => single.is_error(),
            Self::Batch(batch) => batch.iter().any(Response::is_error),
        }
    }

    /// Returns the first error response in the packet, if any.
    pub fn as_error(&self) -> Option<&ErrorPayload<ErrData>> {
        self.iter().find_map(|resp| resp.as_error())
    }

    /// Returns an iterator over the responses in the packet.
    pub fn iter(&self) -> std::slice::Iter<'_, Response<Payload, ErrData>> {
        self.responses().iter()
    }

    /// Returns all responses in the packet as a slice.
    pub const fn responses(&self) -> &[Response<Payload, ErrData>] {
        match self {
            Self::Single(resp) => std::slice::from_ref(resp),
            Self::Batch(batch) => batch.as_slice(),
        }
    }

    /// Consume the packet, returning all responses.
    pub fn into_responses(self) -> Vec<Response<Payload, ErrData>> {
        match self {
            Self::Single(resp) => vec![resp],
            Self::Batch(batch) => batch,
        }
    }

    /// Find a response by its request ID.
    pub fn response_by_id(&self, id: &Id) -> Option<&Response<Payload, ErrData>> {
        self.iter().find(|resp| &resp.id == id)
    }
}
