use crate::ErrorPayload;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::borrow::Borrow;

/// A JSON-RPC 2.0 response payload.
///
/// This enum covers both the success and error cases of a JSON-RPC 2.0
/// response. It is used to represent the `result` and `error` fields of a
/// response object.
///
/// ### Note
///
/// This type does not implement `Serialize` or `Deserialize` directly. It is
/// deserialized as part of the [`Response`] type.
///
/// [`Response`]: crate::Response
#[derive(Clone, Debug)]
pub enum ResponsePayload<Payload = Box<RawValue>, ErrData = Box<RawValue>> {
    /// A successful response payload.
    Success(Payload),
    /// An error response payload.
    Failure(ErrorPayload<ErrData>),
}

impl<Payload, ErrData> ResponsePayload<Payload, ErrData> {
    /// Fallible conversion to the successful payload.
    pub const fn as_success(&self) -> Option<&Payload> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure(_) => None,
        }
    }

    /// Fallible conversion to the error object.
    pub const fn as_error(&self) -> Option<&ErrorPayload<ErrData>> {
        match self {
            Self::Success(_) => None,
            Self::Failure(payload) => Some(payload),
        }
    }

    /// Returns `true` if the response payload is a success.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` if the response payload is an error.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl<Payload, ErrData> ResponsePayload<Payload, ErrData>
where
    Payload: Borrow<RawValue>,
{
    /// Attempt to deserialize the success payload.
    ///
    /// # Returns
    ///
    /// - `None` if the payload is an error response.
    /// - `Some(Ok(T))` if the payload is a success and can be deserialized.
    /// - `Some(Err(err))` if the payload is a success and can't be
    ///   deserialized as `T`.
    pub fn try_success_as<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        match self {
            Self::Success(val) => Some(serde_json::from_str(val.borrow().get())),
            Self::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::value::to_raw_value;

    #[test]
    fn success_deser() {
        let payload: ResponsePayload = ResponsePayload::Success(to_raw_value(&12u64).unwrap());
        assert_eq!(payload.try_success_as::<u64>().unwrap().unwrap(), 12);
        assert!(payload.is_success());
        assert!(payload.as_error().is_none());
    }
}
