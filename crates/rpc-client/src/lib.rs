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

mod batch;
pub use batch::{BatchRequest, Waiter};

mod builder;
pub use builder::ClientBuilder;

mod call;
pub use call::RpcCall;

mod client;
pub use client::{ClientRef, RpcClient, RpcClientInner, WeakClient};

#[cfg(feature = "pubsub")]
pub use ferrite_pubsub::{RawSubscription, Subscription, SubscriptionItem};

#[cfg(feature = "reqwest")]
pub use ferrite_transport_http::ReqwestTransport;

#[cfg(feature = "ws")]
pub use ferrite_transport_ws::WsConnect;
