//! Misc. utilities for building transports.

use crate::error::TransportError;
use serde::Serialize;
use serde_json::value::RawValue;
use std::future::Future;
use url::Url;

/// Guess whether the URL is local, based on the hostname.
///
/// The output of this function is best-efforts, and should be checked if
/// possible. It simply returns `true` if the connection has no hostname,
/// or the hostname is `localhost` or `127.0.0.1`.
pub fn guess_local_url(s: impl AsRef<str>) -> bool {
    fn _guess_local_url(url: &str) -> bool {
        url.parse::<Url>().is_ok_and(|url| {
            url.host_str().is_none_or(|host| host == "localhost" || host == "127.0.0.1")
        })
    }
    _guess_local_url(s.as_ref())
}

/// Convert to a `Box<RawValue>` from a `Serialize` type, mapping the error
/// to a `TransportError`.
pub fn to_json_raw_value<S>(s: &S) -> Result<Box<RawValue>, TransportError>
where
    S: Serialize,
{
    RawValue::from_string(serde_json::to_string(s).map_err(TransportError::ser_err)?)
        .map_err(TransportError::ser_err)
}

#[doc(hidden)]
pub trait Spawnable {
    /// Spawn the future as a task on the ambient tokio runtime.
    fn spawn_task(self);
}

impl<T> Spawnable for T
where
    T: Future<Output = ()> + Send + 'static,
{
    fn spawn_task(self) {
        tokio::spawn(self);
    }
}
