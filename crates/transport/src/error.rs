use ferrite_json_rpc::{ErrorPayload, Id, RpcError, RpcResult};
use serde_json::value::RawValue;
use std::{error::Error as StdError, fmt::Debug};
use thiserror::Error;

/// A transport error is an [`RpcError`] containing a [`TransportErrorKind`].
pub type TransportError<ErrResp = Box<RawValue>> = RpcError<TransportErrorKind, ErrResp>;

/// A transport result is a [`Result`] containing a [`TransportError`].
pub type TransportResult<T, ErrResp = Box<RawValue>> = RpcResult<T, TransportErrorKind, ErrResp>;

/// Transport error.
///
/// All transport errors are wrapped in this enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// The transport was closed by an explicit call to `close`. Terminal.
    #[error("transport has been closed")]
    Closed,

    /// Backend connection task has stopped, or the connection is currently
    /// unavailable (e.g. it is reconnecting). New requests fail fast with
    /// this error rather than queueing indefinitely.
    #[error("backend connection task has stopped")]
    BackendGone,

    /// The per-request deadline elapsed before a response arrived.
    #[error("request timed out before a response arrived")]
    RequestTimeout,

    /// The request was rejected because the client has too many requests
    /// in flight, or the submission queue is full.
    #[error("request rejected due to backpressure")]
    BackpressureRejected,

    /// Missing batch response.
    ///
    /// This error is returned when a batch request is sent and the response
    /// does not contain a response for a request. For convenience the ID is
    /// specified.
    #[error("missing response for request with ID {0}")]
    MissingBatchResponse(Id),

    /// Subscriptions are not available on this provider.
    #[error("subscriptions are not available on this provider")]
    PubsubUnavailable,

    /// HTTP error with code and body.
    #[error("{0}")]
    HttpError(#[from] HttpError),

    /// Every attempt of a retried operation failed.
    #[error(transparent)]
    RetryExhausted(#[from] RetryExhausted),

    /// Custom error.
    #[error("{0}")]
    Custom(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl TransportErrorKind {
    /// Instantiate a new `TransportError` from a custom error.
    pub fn custom_str(err: &str) -> TransportError {
        RpcError::Transport(Self::Custom(err.into()))
    }

    /// Instantiate a new `TransportError` from a custom error.
    pub fn custom(err: impl StdError + Send + Sync + 'static) -> TransportError {
        RpcError::Transport(Self::Custom(Box::new(err)))
    }

    /// Instantiate a new `TransportError::Closed`.
    pub const fn closed() -> TransportError {
        RpcError::Transport(Self::Closed)
    }

    /// Instantiate a new `TransportError::BackendGone`.
    pub const fn backend_gone() -> TransportError {
        RpcError::Transport(Self::BackendGone)
    }

    /// Instantiate a new `TransportError::RequestTimeout`.
    pub const fn request_timeout() -> TransportError {
        RpcError::Transport(Self::RequestTimeout)
    }

    /// Instantiate a new `TransportError::BackpressureRejected`.
    pub const fn backpressure_rejected() -> TransportError {
        RpcError::Transport(Self::BackpressureRejected)
    }

    /// Instantiate a new `TransportError` from a missing ID.
    pub const fn missing_batch_response(id: Id) -> TransportError {
        RpcError::Transport(Self::MissingBatchResponse(id))
    }

    /// Instantiate a new `TransportError::PubsubUnavailable`.
    pub const fn pubsub_unavailable() -> TransportError {
        RpcError::Transport(Self::PubsubUnavailable)
    }

    /// Instantiate a new `TransportError::HttpError`.
    pub const fn http_error(status: u16, body: String) -> TransportError {
        RpcError::Transport(Self::HttpError(HttpError { status, body }))
    }

    /// Returns `true` if the error plausibly clears up on its own, so that a
    /// retry of the same request may succeed.
    ///
    /// Underlying I/O failures (reset, refused, closed connections, read
    /// timeouts) are transient. An explicitly closed transport, a rejected
    /// submission, and an exhausted retry are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MissingBatchResponse(_) => true,
            Self::RequestTimeout => true,
            // The backend may come back after a reconnect.
            Self::BackendGone => true,
            Self::HttpError(err) => err.is_retry_err(),
            Self::Custom(err) => {
                let msg = err.to_string().to_ascii_lowercase();
                msg.contains("connection reset")
                    || msg.contains("connection refused")
                    || msg.contains("connection closed")
                    || msg.contains("broken pipe")
                    || msg.contains("timed out")
                    || msg.contains("429 too many requests")
            }
            Self::Closed
            | Self::BackpressureRejected
            | Self::PubsubUnavailable
            | Self::RetryExhausted(_) => false,
        }
    }
}

/// Type for holding HTTP errors such as 429 rate limit responses.
#[derive(Debug, Error)]
#[error("HTTP error {status} with body: {body}")]
pub struct HttpError {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: String,
}

impl HttpError {
    /// Analyzes the `status` and `body` to determine whether the request
    /// should be retried.
    pub fn is_retry_err(&self) -> bool {
        // alchemy throws it this way
        if self.status == 429 {
            return true;
        }
        // server-side failures are worth another attempt
        if self.status >= 500 {
            return true;
        }

        let msg = self.body.to_ascii_lowercase();
        match msg.as_str() {
            // this is commonly thrown by infura and is apparently a load balancer issue, see also <https://github.com/MetaMask/metamask-extension/issues/7234>
            "header not found" => true,
            // also thrown by infura if out of budget for the day and ratelimited
            "daily request count exceeded, request rate limited" => true,
            msg => {
                msg.contains("rate limit")
                    || msg.contains("rate exceeded")
                    || msg.contains("too many requests")
                    || msg.contains("credits limited")
                    || msg.contains("request limit")
            }
        }
    }
}

impl From<&ErrorPayload> for HttpError {
    fn from(value: &ErrorPayload) -> Self {
        Self { status: 0, body: value.message.clone() }
    }
}

/// Error produced when every attempt of a retried operation has failed.
///
/// Carries the final cause, the number of attempts made, and the display
/// forms of the earlier (suppressed) causes in attempt order.
#[derive(Debug, Error)]
pub struct RetryExhausted {
    /// Total number of attempts made.
    pub attempts: u32,
    /// The error that failed the final attempt.
    #[source]
    pub cause: Box<TransportError>,
    /// Display forms of the causes of earlier attempts, oldest first.
    pub suppressed: Vec<String>,
}

impl std::fmt::Display for RetryExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "retries exhausted after {} attempts: {}", self.attempts, self.cause)
    }
}

impl RetryExhausted {
    /// Wrap into a [`TransportError`].
    pub fn into_error(self) -> TransportError {
        RpcError::Transport(TransportErrorKind::RetryExhausted(self))
    }
}
