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

#[macro_use]
extern crate tracing;

use ferrite_pubsub::ConnectionInterface;

mod native;
pub use native::WsConnect;

/// The default interval between keepalive pings, in seconds.
pub(crate) const DEFAULT_KEEPALIVE: u64 = 10;

/// An ongoing connection to a backend.
///
/// Users should NEVER instantiate a backend directly. Instead, they should use
/// [`PubSubConnect`] to get a running service with a running backend.
///
/// [`PubSubConnect`]: ferrite_pubsub::PubSubConnect
#[derive(Debug)]
pub struct WsBackend<T> {
    /// The websocket connection.
    pub(crate) socket: T,

    /// The interface to the connection.
    pub(crate) interface: ConnectionInterface,

    /// Interval between keepalive pings.
    pub(crate) keepalive_interval: std::time::Duration,
}

impl<T> WsBackend<T> {
    /// Handle inbound text from the websocket.
    ///
    /// Batch frames (JSON arrays of envelopes) are split and forwarded
    /// element by element; each response is then routed by its own id.
    #[allow(clippy::result_unit_err)]
    pub fn handle_text(&mut self, text: &str) -> Result<(), ()> {
        trace!(%text, "received message from websocket");

        let items: Vec<ferrite_json_rpc::PubSubItem> = if text.trim_start().starts_with('[') {
            match serde_json::from_str(text) {
                Ok(items) => items,
                Err(err) => {
                    error!(%err, "failed to deserialize batch message");
                    return Err(());
                }
            }
        } else {
            match serde_json::from_str(text) {
                Ok(item) => vec![item],
                Err(err) => {
                    error!(%err, "failed to deserialize message");
                    return Err(());
                }
            }
        };

        for item in items {
            trace!(?item, "deserialized message");
            if let Err(err) = self.interface.send_to_frontend(item) {
                error!(item = ?err.0, "failed to send deserialized item to handler");
                return Err(());
            }
        }
        Ok(())
    }
}
