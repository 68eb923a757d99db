use crate::common::mocked;
use alloy_primitives::{address, U256};
use ferrite_provider::Provider;
use ferrite_rpc_types::{BlockId, Filter};
use ferrite_transport::RpcError;

#[tokio::test]
async fn chain_id_parses_quantity() {
    let (provider, asserter) = mocked();
    asserter.push_success(&"0x1");
    assert_eq!(provider.get_chain_id().await.unwrap(), 1);
}

#[tokio::test]
async fn chain_id_null_is_protocol_illegal() {
    let (provider, asserter) = mocked();
    asserter.push_success(&serde_json::Value::Null);
    let err = provider.get_chain_id().await.unwrap_err();
    assert!(matches!(err, RpcError::NullResp), "expected NullResp, got {err}");
}

#[tokio::test]
async fn balance_sends_address_and_tag() {
    let (provider, asserter) = mocked();
    asserter.push_success(&"0xde0b6b3a7640000");

    let who = address!("2222222222222222222222222222222222222222");
    let balance = provider.get_balance(who, BlockId::default()).await.unwrap();
    assert_eq!(balance, U256::from(10u64).pow(U256::from(18u64)));

    let recorded = asserter.recorded_requests();
    assert_eq!(recorded[0].method, "eth_getBalance");
    assert_eq!(
        recorded[0].params,
        Some(serde_json::json!(["0x2222222222222222222222222222222222222222", "latest"]))
    );
}

#[tokio::test]
async fn code_null_or_empty_hex_is_empty() {
    let (provider, asserter) = mocked();
    let who = address!("2222222222222222222222222222222222222222");

    asserter.push_success(&serde_json::Value::Null);
    assert!(provider.get_code_at(who, BlockId::default()).await.unwrap().is_empty());

    asserter.push_success(&"0x");
    assert!(provider.get_code_at(who, BlockId::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn logs_null_is_empty_list() {
    let (provider, asserter) = mocked();
    asserter.push_success(&serde_json::Value::Null);
    let logs = provider.get_logs(&Filter::new()).await.unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn call_null_is_empty_bytes() {
    let (provider, asserter) = mocked();
    asserter.push_success(&serde_json::Value::Null);
    let req = ferrite_rpc_types::TransactionRequest::new()
        .with_to(address!("2222222222222222222222222222222222222222"));
    let out = provider.call(&req, BlockId::default()).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn storage_slot_is_minimal_hex() {
    let (provider, asserter) = mocked();
    asserter.push_success(&"0x0");

    let who = address!("2222222222222222222222222222222222222222");
    provider.get_storage_at(who, U256::from(0x20u64), BlockId::default()).await.unwrap();

    let recorded = asserter.recorded_requests();
    assert_eq!(
        recorded[0].params,
        Some(serde_json::json!([
            "0x2222222222222222222222222222222222222222",
            "0x20",
            "latest"
        ]))
    );
}

#[tokio::test]
async fn operations_fail_after_close() {
    let (provider, asserter) = mocked();
    asserter.push_success(&"0x1");

    provider.close();
    provider.close();

    let err = provider.get_chain_id().await.unwrap_err();
    assert!(err.is_local_usage_error());
    assert!(err.to_string().contains("client has been closed"), "got {err}");
    // Nothing was sent.
    assert!(asserter.recorded_requests().is_empty());
}
