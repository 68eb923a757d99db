use crate::Http;
use ferrite_json_rpc::{RequestPacket, ResponsePacket};
use ferrite_transport::{TransportError, TransportErrorKind, TransportFut};
use std::task;
use tower::Service;
use tracing::{debug_span, trace, Instrument};
use url::Url;

/// An [`Http`] transport using [`reqwest`].
pub type ReqwestTransport = Http<reqwest::Client>;

impl Http<reqwest::Client> {
    /// Create a new [`Http`] transport with a default client.
    pub fn new(url: Url) -> Self {
        Self { client: Default::default(), url }
    }

    /// POST the packet and interpret the reply.
    fn request_reqwest(&self, req: RequestPacket) -> TransportFut<'static> {
        let this = self.clone();
        let span = debug_span!("ReqwestTransport", url = %self.url);
        Box::pin(
            async move {
                let resp = this
                    .client
                    .post(this.url)
                    .json(&req)
                    .send()
                    .await
                    .map_err(TransportErrorKind::custom)?;
                let status = resp.status();

                // Proxies and rate limiters put their diagnostics in the body
                // of non-2xx replies, so the body is read before the status
                // is judged and travels with the error.
                let body = resp.bytes().await.map_err(TransportErrorKind::custom)?;
                trace!(%status, body = %String::from_utf8_lossy(&body), "http reply");

                if !status.is_success() {
                    return Err(TransportErrorKind::http_error(
                        status.as_u16(),
                        String::from_utf8_lossy(&body).into_owned(),
                    ));
                }

                // A 2xx body is the JSON-RPC frame (or batch of frames). When
                // it isn't parseable, the offending text rides along in the
                // error; the lossy conversion may not cover every byte.
                serde_json::from_slice(&body)
                    .map_err(|err| TransportError::deser_err(err, String::from_utf8_lossy(&body)))
            }
            .instrument(span),
        )
    }
}

impl Service<RequestPacket> for Http<reqwest::Client> {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    #[inline]
    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        // reqwest manages its own connection pool; the service is always
        // ready.
        task::Poll::Ready(Ok(()))
    }

    #[inline]
    fn call(&mut self, req: RequestPacket) -> Self::Future {
        self.request_reqwest(req)
    }
}

impl Service<RequestPacket> for &Http<reqwest::Client> {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    #[inline]
    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    #[inline]
    fn call(&mut self, req: RequestPacket) -> Self::Future {
        self.request_reqwest(req)
    }
}
