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

mod boxed;
pub use boxed::BoxTransport;

mod common;
pub use common::Authorization;

mod connect;
pub use connect::{BoxTransportConnect, TransportConnect};

mod error;
#[doc(hidden)]
pub use error::TransportErrorKind;
pub use error::{HttpError, RetryExhausted, TransportError, TransportResult};

pub mod layers;
pub use layers::{retry_with, FaultClassifier, RetryBackoffLayer, RetryConfig, RetryPolicy};

pub mod mock;

mod r#trait;
pub use r#trait::Transport;

pub use ferrite_json_rpc::{RpcError, RpcResult};

/// Misc. utilities for building transports.
pub mod utils;

use ferrite_json_rpc::ResponsePacket;

/// Pin-boxed future.
pub type Pbf<'a, T, E> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, E>> + Send + 'a>>;

/// Future for transport-level requests.
pub type TransportFut<'a, T = ResponsePacket, E = TransportError> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, E>> + Send + 'a>>;

/// Future for RPC-level requests.
pub type RpcFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = TransportResult<T>> + Send + 'a>>;
