use crate::{common::Id, RpcSend};
use alloy_primitives::{keccak256, B256};
use serde::{
    de::DeserializeOwned,
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};
use serde_json::value::RawValue;
use std::borrow::Cow;

/// `RequestMeta` contains the [`Id`] and method name of a request.
#[derive(Clone, Debug)]
pub struct RequestMeta {
    /// The method name.
    pub method: Cow<'static, str>,
    /// The request ID.
    pub id: Id,
    /// Whether the request is a subscription, other than `eth_subscribe`.
    is_subscription: bool,
}

impl RequestMeta {
    /// Create a new `RequestMeta`.
    pub const fn new(method: Cow<'static, str>, id: Id) -> Self {
        Self { method, id, is_subscription: false }
    }

    /// Returns `true` if the request is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.is_subscription || self.method == "eth_subscribe"
    }

    /// Indicates that the request is a non-standard subscription (i.e. not
    /// `eth_subscribe`).
    pub const fn set_is_subscription(&mut self) {
        self.set_subscription_status(true);
    }

    /// Setter for `is_subscription`.
    pub const fn set_subscription_status(&mut self, sub: bool) {
        self.is_subscription = sub;
    }
}

/// A JSON-RPC 2.0 request object.
///
/// This is a generic type that can be used to represent any JSON-RPC request.
/// The `Params` type parameter is used to represent the parameters of the
/// request, and the `method` field is used to represent the method name.
///
/// ### Note
///
/// The value of `method` should be known at compile time.
#[derive(Clone, Debug)]
pub struct Request<Params> {
    /// The request metadata (ID and method).
    pub meta: RequestMeta,
    /// The request parameters.
    pub params: Params,
}

impl<Params> Request<Params> {
    /// Create a new `Request`.
    pub fn new(method: impl Into<Cow<'static, str>>, id: Id, params: Params) -> Self {
        Self { meta: RequestMeta::new(method.into(), id), params }
    }

    /// Returns `true` if the request is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.meta.is_subscription()
    }

    /// Indicates that the request is a non-standard subscription (i.e. not
    /// `eth_subscribe`).
    pub const fn set_is_subscription(&mut self) {
        self.meta.set_is_subscription()
    }

    /// Setter for `is_subscription`.
    pub const fn set_subscription_status(&mut self, sub: bool) {
        self.meta.set_subscription_status(sub);
    }

    /// Change type of the request parameters.
    pub fn map_params<NewParams>(
        self,
        map: impl FnOnce(Params) -> NewParams,
    ) -> Request<NewParams> {
        Request { meta: self.meta, params: map(self.params) }
    }
}

impl<Params> Request<Params>
where
    Params: RpcSend,
{
    /// Serialize the request, including the request parameters.
    pub fn serialize(self) -> serde_json::Result<SerializedRequest> {
        let request = serde_json::value::to_raw_value(&self)?;
        Ok(SerializedRequest { meta: self.meta, request })
    }
}

impl<Params> Request<&Params>
where
    Params: ToOwned,
    Params::Owned: RpcSend,
{
    /// Clone the request, including the request parameters.
    pub fn into_owned_params(self) -> Request<Params::Owned> {
        Request { meta: self.meta, params: self.params.to_owned() }
    }
}

impl<Params> Serialize for Request<Params>
where
    Params: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sized_params = std::mem::size_of::<Params>() != 0;

        let mut map = serializer.serialize_map(Some(3 + sized_params as usize))?;
        map.serialize_entry("method", &self.meta.method[..])?;

        // Params may be omitted if it is 0-sized.
        if sized_params {
            map.serialize_entry("params", &self.params)?;
        }

        map.serialize_entry("id", &self.meta.id)?;
        map.serialize_entry("jsonrpc", "2.0")?;
        map.end()
    }
}

/// A JSON-RPC 2.0 request object that has been serialized, with its [`Id`]
/// and method preserved.
///
/// This struct is used to represent a request that has been serialized, but
/// not yet sent. It is used by RPC clients to build batch requests and manage
/// in-flight requests.
#[derive(Clone, Debug)]
pub struct SerializedRequest {
    meta: RequestMeta,
    request: Box<RawValue>,
}

impl<Params> std::convert::TryFrom<Request<Params>> for SerializedRequest
where
    Params: RpcSend,
{
    type Error = serde_json::Error;

    fn try_from(value: Request<Params>) -> Result<Self, Self::Error> {
        value.serialize()
    }
}

impl SerializedRequest {
    /// Returns the request metadata (ID and Method).
    pub const fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    /// Returns the request ID.
    pub const fn id(&self) -> &Id {
        &self.meta.id
    }

    /// Returns the request method.
    pub fn method(&self) -> &str {
        &self.meta.method
    }

    /// Returns `true` if the request is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.meta.is_subscription()
    }

    /// Returns the serialized request.
    pub const fn serialized(&self) -> &RawValue {
        &self.request
    }

    /// Consume the serialized request, returning the underlying [`RawValue`].
    pub fn take_request(self) -> Box<RawValue> {
        self.request
    }

    /// Get a hash of the serialized request's contents. Used by streaming
    /// clients as a connection-independent key for subscriptions.
    pub fn params_hash(&self) -> B256 {
        keccak256(self.request.get())
    }

    /// Attempt to deserialize the params.
    ///
    /// To borrow from the params via the deserializer, use
    /// [`SerializedRequest::try_borrow_params_as`].
    pub fn try_params_as<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.try_borrow_params_as()
    }

    /// Attempt to deserialize the params, borrowing from the request.
    pub fn try_borrow_params_as<'a, T: Deserialize<'a>>(&'a self) -> serde_json::Result<Option<T>> {
        #[derive(Deserialize)]
        struct Req<T> {
            params: Option<T>,
        }
        serde_json::from_str::<Req<T>>(self.request.get()).map(|req| req.params)
    }
}

impl Serialize for SerializedRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.request.serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serializes_flat() {
        let req = Request::new("eth_getBalance", Id::Number(1), ("0x1234", "latest"));
        let ser = req.serialize().unwrap();
        assert_eq!(
            ser.serialized().get(),
            r#"{"method":"eth_getBalance","params":["0x1234","latest"],"id":1,"jsonrpc":"2.0"}"#
        );
    }

    #[test]
    fn omits_unit_params() {
        let req = Request::new("eth_chainId", Id::Number(0), ());
        let ser = req.serialize().unwrap();
        assert_eq!(ser.serialized().get(), r#"{"method":"eth_chainId","id":0,"jsonrpc":"2.0"}"#);
    }

    #[test]
    fn recovers_params() {
        let req = Request::new("eth_getBalance", Id::Number(1), ("0x1234", "latest"));
        let ser = req.serialize().unwrap();
        let params: Option<(String, String)> = ser.try_params_as().unwrap();
        assert_eq!(params, Some(("0x1234".to_string(), "latest".to_string())));
    }
}
