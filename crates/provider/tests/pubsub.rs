//! Streaming-provider tests, driven over an in-process connection.

#![cfg(feature = "pubsub")]
#![allow(missing_docs)]

use ferrite_provider::{Provider, ProviderBuilder, RootProvider};
use ferrite_pubsub::{ConnectionHandle, ConnectionInterface, PubSubConnect, PubSubFrontend};
use ferrite_transport::{RpcError, TransportErrorKind, TransportResult};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
struct TestConnector {
    interfaces: mpsc::UnboundedSender<ConnectionInterface>,
}

impl PubSubConnect for TestConnector {
    fn is_local(&self) -> bool {
        true
    }

    async fn connect(&self) -> TransportResult<ConnectionHandle> {
        let (handle, interface) = ConnectionHandle::new();
        self.interfaces.send(interface).map_err(|_| TransportErrorKind::backend_gone())?;
        Ok(handle)
    }
}

async fn connect() -> (RootProvider<PubSubFrontend>, ConnectionInterface) {
    let (tx, mut interfaces) = mpsc::unbounded_channel();
    let provider =
        ProviderBuilder::new().connect_pubsub(TestConnector { interfaces: tx }).await.unwrap();
    let interface = interfaces.recv().await.unwrap();
    (provider, interface)
}

/// Answer the next outgoing frame with the given result.
async fn answer(interface: &mut ConnectionInterface, result: &str) -> serde_json::Value {
    let raw = tokio::time::timeout(Duration::from_secs(1), interface.recv_from_frontend())
        .await
        .expect("timed out waiting for outgoing frame")
        .expect("connection closed");
    let frame: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
    let response = format!(r#"{{"jsonrpc":"2.0","id":{},"result":{result}}}"#, frame["id"]);
    interface.send_to_frontend(serde_json::from_str(&response).unwrap()).unwrap();
    frame
}

#[tokio::test]
async fn subscribe_blocks_end_to_end() {
    let (provider, mut interface) = connect().await;
    assert!(provider.can_subscribe());

    let subscribe = provider.subscribe_blocks();
    let frame_fut = answer(&mut interface, r#""0xc0ffee""#);
    let (sub, frame) = tokio::join!(subscribe, frame_fut);
    let mut sub = sub.unwrap();

    assert_eq!(frame["method"], "eth_subscribe");
    assert_eq!(frame["params"], serde_json::json!(["newHeads"]));

    interface
        .send_to_frontend(
            serde_json::from_str(
                r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0xc0ffee","result":{
                    "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                    "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
                    "number": "0x10",
                    "timestamp": "0x64"
                }}}"#,
            )
            .unwrap(),
        )
        .unwrap();

    let header = tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.number, 16);

    // Unsubscribing releases the sink locally and tells the server.
    provider.unsubscribe(sub.local_id()).unwrap();
    let raw = tokio::time::timeout(Duration::from_secs(1), interface.recv_from_frontend())
        .await
        .unwrap()
        .unwrap();
    let frame: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
    assert_eq!(frame["method"], "eth_unsubscribe");
    assert_eq!(frame["params"], serde_json::json!(["0xc0ffee"]));
}

#[tokio::test]
async fn request_response_providers_cannot_subscribe() {
    let asserter = ferrite_transport::mock::Asserter::new();
    let provider = ProviderBuilder::new().connect_mocked_client(asserter);
    assert!(!provider.can_subscribe());

    let err = provider.subscribe_blocks().await.unwrap_err();
    assert!(
        matches!(err, RpcError::Transport(TransportErrorKind::PubsubUnavailable)),
        "expected PubsubUnavailable, got {err}"
    );
}

#[tokio::test]
async fn provider_close_tears_down_the_stream() {
    let (provider, _interface) = connect().await;
    provider.close();
    provider.close();

    let err = provider.get_chain_id().await.unwrap_err();
    assert!(err.is_local_usage_error());
}
