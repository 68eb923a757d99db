#![doc = include_str!("../README.md")]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod common;
pub use common::Id;

mod error;
pub use error::RpcError;

mod notification;
pub use notification::{EthNotification, PubSubItem};

mod packet;
pub use packet::{RequestPacket, ResponsePacket};

mod request;
pub use request::{Request, RequestMeta, SerializedRequest};

mod response;
pub use response::{
    ErrorPayload, Response, ResponsePayload, INTERNAL_ERROR_CODE, METHOD_NOT_FOUND_CODE,
};

mod result;
pub use result::{transform_response, try_deserialize_ok, RpcResult};

use serde::{de::DeserializeOwned, Serialize};

/// An object that can be sent as a JSON-RPC parameter.
///
/// This marker trait is blanket-implemented for every qualifying type.
pub trait RpcSend: Serialize + Clone + Send + Sync + Unpin {}
impl<T> RpcSend for T where T: Serialize + Clone + Send + Sync + Unpin {}

/// An object that can be received as a JSON-RPC return value.
///
/// This marker trait is blanket-implemented for every qualifying type.
///
/// # Note
///
/// We add the `'static` lifetime bound to indicate that the type can't
/// borrow. This is a simplification that makes it easier to use the types in
/// client code. It is not suitable for use in server code.
pub trait RpcRecv: DeserializeOwned + Send + Sync + Unpin + 'static {}
impl<T> RpcRecv for T where T: DeserializeOwned + Send + Sync + Unpin + 'static {}

/// An object that can be both sent and received over JSON-RPC.
///
/// This marker trait is blanket-implemented for every qualifying type.
pub trait RpcObject: RpcSend + RpcRecv {}
impl<T> RpcObject for T where T: RpcSend + RpcRecv {}
