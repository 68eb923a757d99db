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

mod connect;
pub use connect::PubSubConnect;

mod frontend;
pub use frontend::PubSubFrontend;

mod handle;
pub use handle::{ConnectionHandle, ConnectionInterface};

mod ix;

mod managers;

mod service;
pub use service::ServiceConfig;

mod stats;
pub use stats::PubSubStats;

mod sub;
pub use sub::{RawSubscription, RecvError, Subscription, SubscriptionItem};

/// Number of submissions the frontend-to-service channel buffers before new
/// submissions are rejected with a backpressure error.
pub const RING_BUFFER_SIZE: usize = 4096;

/// Maximum number of requests that may be awaiting a response at once.
pub const MAX_PENDING_REQUESTS: usize = 65_536;

/// Number of consecutive failed reconnect attempts after which the service
/// gives up and closes permanently.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;
