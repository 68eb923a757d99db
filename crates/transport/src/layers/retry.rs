use crate::{
    error::{RetryExhausted, TransportError, TransportErrorKind},
    TransportFut,
};
use ferrite_json_rpc::{ErrorPayload, RequestPacket, ResponsePacket, RpcError};
use serde::Deserialize;
use std::{
    future::Future,
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};
use tracing::trace;

/// Message fragments that mark an in-band error as terminal: retrying the
/// identical request cannot succeed.
const TERMINAL_MESSAGES: &[&str] = &[
    "insufficient funds",
    "nonce too low",
    "nonce too high",
    "already known",
    "invalid sender",
    "execution reverted",
];

/// Backoff schedule configuration for retried requests.
///
/// Between attempt `n` and `n + 1` the caller sleeps
/// `min(base * 2^(n-1), max) * (1 + U[jitter_min, jitter_max))`, with the cap
/// applied before the jitter factor.
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Base backoff duration. Default 200ms.
    pub base: Duration,
    /// Maximum backoff duration before jitter. Default 5s.
    pub max: Duration,
    /// Lower jitter bound (fraction added to the delay). Default 0.10.
    pub jitter_min: f64,
    /// Upper jitter bound, exclusive. Default 0.25.
    pub jitter_max: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            max: Duration::from_secs(5),
            jitter_min: 0.10,
            jitter_max: 0.25,
        }
    }
}

impl RetryConfig {
    /// Compute the backoff before attempt `attempt + 1`, given a jitter unit
    /// sample in `[0, 1)`.
    fn backoff_with_unit(&self, attempt: u32, unit: f64) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let raw = self.base.saturating_mul(1u32 << exp).min(self.max);
        let jitter = self.jitter_min + unit * (self.jitter_max - self.jitter_min);
        raw.mul_f64(1.0 + jitter)
    }

    /// Compute the backoff before attempt `attempt + 1` with a fresh jitter
    /// sample.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_with_unit(attempt, rand::random::<f64>())
    }
}

/// [`RetryPolicy`] defines logic for which [`TransportError`] instances the
/// client should retry the request on, attempting to recover transparently.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Whether to retry the request based on the given `error`.
    fn should_retry(&self, error: &TransportError) -> bool;

    /// Providers may include the `backoff` in the error response directly.
    fn backoff_hint(&self, error: &TransportError) -> Option<Duration>;
}

/// The default [`RetryPolicy`].
///
/// A failure is transient when it stems from the connection (resets, refused
/// or closed connections, read timeouts), from load shedding ("rate limit",
/// "too many requests"), from nodes that have not caught up ("header not
/// found"), or is a bare internal error (`-32603`) carrying no revert data.
///
/// A failure is terminal when the node understood the request and rejected
/// it: method not found (`-32601`), any error carrying hex revert data, the
/// well-known rejection messages (insufficient funds, nonce too low/high,
/// already known, invalid sender, execution reverted), or a malformed error
/// with a null or empty message (never retried, to avoid spinning on garbage).
#[derive(Clone, Copy, Debug, Default)]
pub struct FaultClassifier;

impl RetryPolicy for FaultClassifier {
    fn should_retry(&self, error: &TransportError) -> bool {
        match error {
            RpcError::Transport(err) => err.is_retryable(),
            // The transport could not serialize the request. It was malformed
            // from the start.
            RpcError::SerError(_) => false,
            RpcError::DeserError { text, .. } => {
                if let Ok(resp) = serde_json::from_str::<ErrorPayload>(text) {
                    return should_retry_json_rpc_error(&resp);
                }

                // some providers send invalid JSON-RPC in the error case (no
                // `id:u64`), but the text should be an error payload
                #[derive(Deserialize)]
                struct Resp {
                    error: ErrorPayload,
                }

                if let Ok(resp) = serde_json::from_str::<Resp>(text) {
                    return should_retry_json_rpc_error(&resp.error);
                }

                false
            }
            RpcError::ErrorResp(err) => should_retry_json_rpc_error(err),
            RpcError::NullResp => true,
            RpcError::UnsupportedFeature(_) => false,
            RpcError::LocalUsageError(_) => false,
        }
    }

    /// Provides a backoff hint if the error response contains it.
    fn backoff_hint(&self, error: &TransportError) -> Option<Duration> {
        if let RpcError::ErrorResp(resp) = error {
            let data = resp.try_data_as::<serde_json::Value>();
            if let Some(Ok(data)) = data {
                // if daily rate limit exceeded, infura returns the requested
                // backoff in the error response
                let backoff_seconds = &data["rate"]["backoff_seconds"];
                if let Some(seconds) = backoff_seconds.as_u64() {
                    return Some(Duration::from_secs(seconds));
                }
                if let Some(seconds) = backoff_seconds.as_f64() {
                    return Some(Duration::from_secs(seconds as u64 + 1));
                }
            }
        }
        None
    }
}

/// Analyzes an [`ErrorPayload`] and decides whether the request should be
/// retried. Message matching is case-insensitive substring matching.
fn should_retry_json_rpc_error(error: &ErrorPayload) -> bool {
    // Revert data marks a terminal execution failure regardless of message.
    if error.as_revert_data().is_some() {
        return false;
    }
    if error.is_method_not_found() {
        return false;
    }

    let msg = error.message.to_ascii_lowercase();
    // Malformed errors with no message are terminal, so a broken server
    // cannot trap the client in a retry loop.
    if msg.is_empty() {
        return false;
    }
    if TERMINAL_MESSAGES.iter().any(|term| msg.contains(term)) {
        return false;
    }

    if msg.contains("header not found") {
        return true;
    }
    if msg.contains("rate limit")
        || msg.contains("rate exceeded")
        || msg.contains("too many requests")
        || msg.contains("request limit")
    {
        return true;
    }

    // Bare internal error with no revert data.
    error.code == ferrite_json_rpc::INTERNAL_ERROR_CODE
}

/// Run a fallible async operation under the retry policy.
///
/// The closure is invoked at most `max_attempts` times. Terminal errors
/// propagate immediately; transient errors are absorbed until the attempt
/// budget runs out, at which point a
/// [`RetryExhausted`](crate::RetryExhausted) error carrying the final cause
/// and the display forms of the earlier causes is returned.
pub async fn retry_with<T, F, Fut>(
    max_attempts: u32,
    config: RetryConfig,
    mut op: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut suppressed = Vec::new();

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if !FaultClassifier.should_retry(&err) {
                    return Err(err);
                }
                if attempt == max_attempts {
                    return Err(RetryExhausted {
                        attempts: max_attempts,
                        cause: Box::new(err),
                        suppressed,
                    }
                    .into_error());
                }
                trace!(%err, attempt, "retrying after transient error");
                suppressed.push(err.to_string());
                tokio::time::sleep(config.backoff(attempt)).await;
            }
        }
    }
    unreachable!("loop returns on the final attempt")
}

/// A transport layer that retries requests that failed with a transient
/// error, sleeping a jittered exponential backoff between attempts.
///
/// See [`FaultClassifier`] for the transient/terminal split.
#[derive(Clone, Debug)]
pub struct RetryBackoffLayer<P = FaultClassifier> {
    /// The maximum number of attempts per request (including the first).
    max_attempts: u32,
    /// The backoff schedule.
    config: RetryConfig,
    /// The retry policy.
    policy: P,
}

impl RetryBackoffLayer {
    /// Creates a new retry layer with the given attempt budget and the
    /// default policy and schedule.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts, config: RetryConfig::default(), policy: FaultClassifier }
    }

    /// Sets the backoff schedule.
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }
}

impl<P: RetryPolicy + Clone> RetryBackoffLayer<P> {
    /// Creates a new retry layer with a custom policy.
    pub const fn with_policy(max_attempts: u32, config: RetryConfig, policy: P) -> Self {
        Self { max_attempts, config, policy }
    }
}

impl<S, P: RetryPolicy + Clone> Layer<S> for RetryBackoffLayer<P> {
    type Service = RetryBackoffService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryBackoffService {
            inner,
            policy: self.policy.clone(),
            max_attempts: self.max_attempts,
            config: self.config,
        }
    }
}

/// A [`tower::Service`] used by the [`RetryBackoffLayer`] that retries
/// requests based on the error type.
///
/// In-band error objects are classified without being surfaced: a retryable
/// error response is discarded and the next attempt taken; a terminal error
/// response is returned unchanged, for the caller to convert into a typed
/// error.
#[derive(Clone, Debug)]
pub struct RetryBackoffService<S, P = FaultClassifier> {
    /// The inner service.
    inner: S,
    /// The retry policy.
    policy: P,
    /// The maximum number of attempts per request (including the first).
    max_attempts: u32,
    /// The backoff schedule.
    config: RetryConfig,
}

impl<S, P> Service<RequestPacket> for RetryBackoffService<S, P>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Send
        + 'static
        + Clone,
    S::Future: Send + 'static,
    P: RetryPolicy + Clone + 'static,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // This middleware doesn't add backpressure of its own.
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let inner = self.inner.clone();
        let this = self.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);
        Box::pin(async move {
            let max_attempts = this.max_attempts.max(1);
            let mut suppressed = Vec::new();

            for attempt in 1..=max_attempts {
                let err = match inner.call(request.clone()).await {
                    Ok(res) => match res.as_error() {
                        // A retryable in-band error is discarded and the
                        // request reattempted. A terminal one is the caller's
                        // to interpret; hand the response back untouched.
                        Some(err) if should_retry_json_rpc_error(err) => {
                            RpcError::ErrorResp(err.clone())
                        }
                        _ => return Ok(res),
                    },
                    Err(err) => {
                        if !this.policy.should_retry(&err) {
                            return Err(err);
                        }
                        err
                    }
                };

                if attempt == max_attempts {
                    return Err(RetryExhausted {
                        attempts: max_attempts,
                        cause: Box::new(err),
                        suppressed,
                    }
                    .into_error());
                }

                let backoff =
                    this.policy.backoff_hint(&err).unwrap_or_else(|| this.config.backoff(attempt));
                trace!(%err, attempt, ?backoff, "retrying request after transient failure");
                suppressed.push(err.to_string());
                tokio::time::sleep(backoff).await;
            }
            unreachable!("loop returns on the final attempt")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Asserter, MockTransport};
    use ferrite_json_rpc::{Id, Request};
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    fn err(code: i64, message: &str, data: Option<&str>) -> ErrorPayload {
        ErrorPayload {
            code,
            message: message.into(),
            data: data.map(|d| {
                serde_json::value::RawValue::from_string(format!("\"{d}\"")).unwrap()
            }),
        }
    }

    fn rpc_err(code: i64, message: &str, data: Option<&str>) -> TransportError {
        RpcError::ErrorResp(err(code, message, data))
    }

    #[test]
    fn classifier_is_deterministic_on_code_and_message() {
        let retryable = [
            rpc_err(-32000, "header not found", None),
            rpc_err(-32005, "Rate Limit reached", None),
            rpc_err(429, "too many requests", None),
            rpc_err(-32603, "internal error", None),
            TransportErrorKind::backend_gone(),
            TransportErrorKind::request_timeout(),
            TransportErrorKind::custom_str("connection reset by peer"),
        ];
        for e in &retryable {
            assert!(FaultClassifier.should_retry(e), "expected retryable: {e}");
        }

        let terminal = [
            rpc_err(-32601, "Method not found", None),
            rpc_err(-32000, "execution reverted", Some("0x08c379a0deadbeef")),
            // revert data wins even with a transient-looking message
            rpc_err(-32603, "internal error", Some("0x08c379a0deadbeef")),
            rpc_err(-32000, "insufficient funds for transfer", None),
            rpc_err(-32000, "nonce too low", None),
            rpc_err(-32000, "nonce too high", None),
            rpc_err(-32000, "already known", None),
            rpc_err(-32000, "invalid sender", None),
            rpc_err(-32000, "", None),
            TransportErrorKind::closed(),
            TransportErrorKind::backpressure_rejected(),
        ];
        for e in &terminal {
            assert!(!FaultClassifier.should_retry(e), "expected terminal: {e}");
        }
    }

    #[test]
    fn backoff_is_capped_then_jittered() {
        let config = RetryConfig::default();
        for attempt in 1..10u32 {
            let raw = config.base.saturating_mul(1 << (attempt - 1)).min(config.max);
            let lo = config.backoff_with_unit(attempt, 0.0);
            let hi = config.backoff_with_unit(attempt, 0.999_999);
            assert_eq!(lo, raw.mul_f64(1.0 + config.jitter_min));
            assert!(hi < raw.mul_f64(1.0 + config.jitter_max));
            assert!(lo <= hi);
        }
        // cap applies before jitter: the tenth attempt is bounded by max
        let deep = config.backoff_with_unit(10, 0.999_999);
        assert!(deep < config.max.mul_f64(1.0 + config.jitter_max));
    }

    fn tiny_config() -> RetryConfig {
        RetryConfig {
            base: Duration::from_millis(1),
            max: Duration::from_millis(2),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn retry_exhaustion_reports_suppressed_causes() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_with(3, tiny_config(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(rpc_err(-32000, "header not found", None)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        let RpcError::Transport(TransportErrorKind::RetryExhausted(exhausted)) = err else {
            panic!("expected RetryExhausted, got {err}");
        };
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.suppressed.len(), 2);
        assert!(exhausted.cause.to_string().contains("header not found"));
    }

    #[tokio::test]
    async fn terminal_error_propagates_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_with(5, tiny_config(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(rpc_err(-32000, "execution reverted", Some("0x08c379a0deadbeef"))) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.unwrap_err().is_error_resp());
    }

    fn request() -> RequestPacket {
        Request::new("eth_chainId", Id::Number(0), ()).serialize().unwrap().into()
    }

    #[tokio::test]
    async fn layer_absorbs_transient_in_band_errors() {
        let asserter = Asserter::new();
        asserter.push_failure(err(-32005, "rate limit reached", None));
        asserter.push_success(&"0x1");

        let mut service = RetryBackoffLayer::new(3)
            .with_config(tiny_config())
            .layer(MockTransport::new(asserter.clone()));

        let resp = service.call(request()).await.unwrap();
        assert!(!resp.is_error());
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test]
    async fn layer_returns_terminal_in_band_errors_untouched() {
        let asserter = Asserter::new();
        asserter.push_failure(err(-32601, "Method not found", None));
        // A second queued response proves no retry consumed it.
        asserter.push_success(&"0x1");

        let mut service = RetryBackoffLayer::new(5)
            .with_config(tiny_config())
            .layer(MockTransport::new(asserter.clone()));

        let resp = service.call(request()).await.unwrap();
        let payload = resp.as_error().unwrap();
        assert!(payload.is_method_not_found());
        assert_eq!(asserter.read_q().len(), 1);
    }
}
