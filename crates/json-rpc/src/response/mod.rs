use crate::common::Id;
use serde::{
    de::{DeserializeOwned, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_json::value::RawValue;
use std::{fmt, marker::PhantomData};

mod error;
pub use error::{ErrorPayload, INTERNAL_ERROR_CODE, METHOD_NOT_FOUND_CODE};

mod payload;
pub use payload::ResponsePayload;

/// A JSON-RPC 2.0 response object containing a [`ResponsePayload`].
///
/// This object is used to represent a JSON-RPC 2.0 response. It may contain
/// either a successful result or an error. The `id` field is used to match
/// the response to the request that it is responding to, and should be
/// mirrored from the response.
#[derive(Clone, Debug)]
pub struct Response<Payload = Box<RawValue>, ErrData = Box<RawValue>> {
    /// The ID of the request that this response is responding to.
    pub id: Id,
    /// The response payload.
    pub payload: ResponsePayload<Payload, ErrData>,
}

impl<Payload, ErrData> Response<Payload, ErrData> {
    /// Returns `true` if the response is a success.
    pub const fn is_success(&self) -> bool {
        self.payload.is_success()
    }

    /// Returns `true` if the response is an error.
    pub const fn is_error(&self) -> bool {
        self.payload.is_error()
    }

    /// Fallible conversion to the successful payload.
    pub const fn as_success(&self) -> Option<&Payload> {
        self.payload.as_success()
    }

    /// Fallible conversion to the error object.
    pub const fn as_error(&self) -> Option<&ErrorPayload<ErrData>> {
        self.payload.as_error()
    }
}

impl<Payload, ErrData> Response<Payload, ErrData>
where
    Payload: AsRef<RawValue>,
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
        match &self.payload {
            ResponsePayload::Success(val) => Some(serde_json::from_str(val.as_ref().get())),
            ResponsePayload::Failure(_) => None,
        }
    }
}

impl<Payload, ErrData> Serialize for Response<Payload, ErrData>
where
    Payload: Serialize,
    ErrData: Serialize,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", "2.0")?;
        map.serialize_entry("id", &self.id)?;
        match &self.payload {
            ResponsePayload::Success(result) => map.serialize_entry("result", result)?,
            ResponsePayload::Failure(error) => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

impl<'de, Payload, ErrData> Deserialize<'de> for Response<Payload, ErrData>
where
    Payload: Deserialize<'de>,
    ErrData: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        enum Field {
            Result,
            Error,
            Id,
            Unknown,
        }

        impl<'de> Deserialize<'de> for Field {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Field, D::Error> {
                struct FieldVisitor;

                impl serde::de::Visitor<'_> for FieldVisitor {
                    type Value = Field;

                    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                        formatter.write_str("`result`, `error` and `id`")
                    }

                    fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Field, E> {
                        match value {
                            "result" => Ok(Field::Result),
                            "error" => Ok(Field::Error),
                            "id" => Ok(Field::Id),
                            _ => Ok(Field::Unknown),
                        }
                    }
                }
                deserializer.deserialize_identifier(FieldVisitor)
            }
        }

        struct ResponseVisitor<T>(PhantomData<T>);

        impl<'de, Payload, ErrData> Visitor<'de> for ResponseVisitor<fn() -> (Payload, ErrData)>
        where
            Payload: Deserialize<'de>,
            ErrData: Deserialize<'de>,
        {
            type Value = Response<Payload, ErrData>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(
                    "a JSON-RPC response object, consisting of either a result or an error",
                )
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
                let mut result = None;
                let mut error = None;
                let mut id: Option<Id> = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Result => {
                            if result.is_some() {
                                return Err(serde::de::Error::duplicate_field("result"));
                            }
                            result = Some(map.next_value()?);
                        }
                        Field::Error => {
                            if error.is_some() {
                                return Err(serde::de::Error::duplicate_field("error"));
                            }
                            error = Some(map.next_value()?);
                        }
                        Field::Id => {
                            if id.is_some() {
                                return Err(serde::de::Error::duplicate_field("id"));
                            }
                            id = Some(map.next_value()?);
                        }
                        Field::Unknown => {
                            let _: serde::de::IgnoredAny = map.next_value()?;
                        }
                    }
                }

                let id = id.unwrap_or(Id::None);

                match (result, error) {
                    (Some(result), None) => {
                        Ok(Response { id, payload: ResponsePayload::Success(result) })
                    }
                    (None, Some(error)) => {
                        Ok(Response { id, payload: ResponsePayload::Failure(error) })
                    }
                    (None, None) => Err(serde::de::Error::missing_field("result or error")),
                    (Some(_), Some(_)) => Err(serde::de::Error::custom(
                        "result and error are mutually exclusive",
                    )),
                }
            }
        }

        deserializer.deserialize_map(ResponseVisitor(PhantomData))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deser_success() {
        let response = r#"{
            "jsonrpc": "2.0",
            "result": "california",
            "id": 1
        }"#;
        let response: Response = serde_json::from_str(response).unwrap();
        assert_eq!(response.id, Id::Number(1));
        assert!(matches!(response.payload, ResponsePayload::Success(_)));
    }

    #[test]
    fn deser_err() {
        let response = r#"{
            "jsonrpc": "2.0",
            "error": {
                "code": -32600,
                "message": "Invalid Request"
            },
            "id": null
        }"#;
        let response: Response = serde_json::from_str(response).unwrap();
        assert_eq!(response.id, Id::None);
        assert!(matches!(response.payload, ResponsePayload::Failure(_)));
    }

    #[test]
    fn deser_rejects_both() {
        let response = r#"{
            "jsonrpc": "2.0",
            "result": "0x1",
            "error": { "code": -32000, "message": "nope" },
            "id": 1
        }"#;
        let response: Result<Response, _> = serde_json::from_str(response);
        assert!(response.is_err());
    }

    #[test]
    fn deser_rejects_neither() {
        let response = r#"{ "jsonrpc": "2.0", "id": 1 }"#;
        let response: Result<Response, _> = serde_json::from_str(response);
        assert!(response.is_err());
    }

    #[test]
    fn deser_null_result() {
        // null results are valid responses, not errors. Conversion to an
        // absent value happens at the typed layer.
        let response = r#"{ "jsonrpc": "2.0", "result": null, "id": 1 }"#;
        let response: Response = serde_json::from_str(response).unwrap();
        let payload = response.as_success().unwrap();
        assert_eq!(payload.get(), "null");
    }
}
