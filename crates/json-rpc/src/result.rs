use crate::{Response, ResponsePayload, RpcError, RpcRecv};
use serde_json::value::RawValue;

/// The result of a JSON-RPC request: either a deserialized success value, or
/// an [`RpcError`] covering in-band error responses and transport failures.
pub type RpcResult<T, E, ErrResp = Box<RawValue>> = Result<T, RpcError<E, ErrResp>>;

/// Transform a [`Response`] into an [`RpcResult`], converting any in-band
/// error payload into an [`RpcError::ErrorResp`].
pub fn transform_response<T, E, ErrResp>(response: Response<T, ErrResp>) -> RpcResult<T, E, ErrResp>
where
    ErrResp: RpcRecv,
{
    match response.payload {
        ResponsePayload::Failure(err_resp) => Err(RpcError::err_resp(err_resp)),
        ResponsePayload::Success(result) => Ok(result),
    }
}

/// Attempt to deserialize the `Ok(_)` inner value of an [`RpcResult`] over a
/// raw value.
///
/// A raw `null` result deserializes into `T` if `T` accepts null (e.g.
/// `Option<_>` or `()`); otherwise it is reported as [`RpcError::NullResp`],
/// never as a deserialization error. This is the seam where "null means
/// absent" queries and "null is protocol-illegal" queries diverge.
pub fn try_deserialize_ok<J, T, E, ErrResp>(result: RpcResult<J, E, ErrResp>) -> RpcResult<T, E, ErrResp>
where
    J: std::borrow::Borrow<RawValue>,
    T: RpcRecv,
{
    let json = result?;
    let text = json.borrow().get();
    serde_json::from_str(text).map_err(|err| {
        if text.trim() == "null" {
            RpcError::NullResp
        } else {
            RpcError::DeserError { err, text: text.to_owned() }
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Id;
    use serde_json::value::to_raw_value;

    fn ok_response(raw: &str) -> Response {
        Response {
            id: Id::Number(1),
            payload: ResponsePayload::Success(to_raw_value(
                &serde_json::from_str::<serde_json::Value>(raw).unwrap(),
            )
            .unwrap()),
        }
    }

    #[test]
    fn null_is_absent_for_options() {
        let result = transform_response::<_, (), _>(ok_response("null"));
        let value: Option<u64> = try_deserialize_ok(result).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn null_is_error_for_required_values() {
        let result = transform_response::<_, (), _>(ok_response("null"));
        let err = try_deserialize_ok::<_, u64, (), _>(result).unwrap_err();
        assert!(matches!(err, RpcError::NullResp));
    }

    #[test]
    fn error_payload_becomes_error_resp() {
        let response: Response =
            serde_json::from_str(r#"{"id":1,"error":{"code":-32000,"message":"oops"}}"#).unwrap();
        let err = transform_response::<_, (), _>(response).unwrap_err();
        assert!(err.is_error_resp());
    }
}
