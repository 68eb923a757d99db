use crate::common::mocked;
use alloy_primitives::{address, U256};
use ferrite_provider::{Provider, ProviderBuilder, SimulateError};
use ferrite_rpc_types::{
    BlockNumberOrTag, CallResult, SimulatePayload, StateOverridesBuilder, TransactionRequest,
};
use similar_asserts::assert_eq;

fn payload() -> SimulatePayload {
    let call = TransactionRequest::new()
        .with_to(address!("2222222222222222222222222222222222222222"))
        .with_input(vec![0x12, 0x34]);
    let overrides = StateOverridesBuilder::new()
        .with_balance(
            address!("3333333333333333333333333333333333333333"),
            U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)),
        )
        .with_nonce(address!("3333333333333333333333333333333333333333"), 42)
        .build()
        .unwrap();
    SimulatePayload::new(vec![call])
        .with_state_overrides(overrides)
        .with_trace_asset_changes(true)
}

#[tokio::test]
async fn encodes_positional_params() {
    let (provider, asserter) = mocked();
    asserter.push_success(&serde_json::json!([{
        "number": "0x1",
        "calls": [{ "status": "0x1", "returnData": "0xabcd", "gasUsed": "0x5208" }]
    }]));

    let result = provider.simulate(&payload(), BlockNumberOrTag::Latest).await.unwrap();
    assert_eq!(result.results.len(), 1);
    assert!(matches!(&result.results[0], CallResult::Success { .. }));

    let recorded = asserter.recorded_requests();
    assert_eq!(recorded[0].method, "eth_simulateV1");
    assert_eq!(
        recorded[0].params,
        Some(serde_json::json!([
            {
                "blockStateCalls": [{
                    "calls": [{
                        "to": "0x2222222222222222222222222222222222222222",
                        "data": "0x1234"
                    }],
                    "stateOverrides": {
                        "0x3333333333333333333333333333333333333333": {
                            "balance": "0x56bc75e2d63100000",
                            "nonce": "0x2a"
                        }
                    }
                }],
                "traceAssetChanges": true,
                "validation": true
            },
            "latest"
        ]))
    );
}

#[tokio::test]
async fn method_not_found_is_terminal_and_not_retried() {
    // Retries are in the stack; the -32601 must pass through untouched.
    let asserter = ferrite_transport::mock::Asserter::new();
    let provider = ProviderBuilder::new().with_retries(5).connect_mocked_client(asserter.clone());

    asserter.push_failure(ferrite_json_rpc::ErrorPayload {
        code: -32601,
        message: "Method not found".into(),
        data: None,
    });
    // A sentinel that a retry would have consumed.
    asserter.push_success(&"0x1");

    let err = provider.simulate(&payload(), BlockNumberOrTag::Latest).await.unwrap_err();
    assert!(matches!(err, SimulateError::NotSupported), "expected NotSupported, got {err}");
    assert!(err.to_string().contains("eth_simulateV1"));
    assert_eq!(asserter.read_q().len(), 1);
}

#[tokio::test]
async fn failure_results_carry_revert_data() {
    let (provider, asserter) = mocked();
    asserter.push_success(&serde_json::json!([{
        "calls": [{
            "status": "0x0",
            "returnData": "0x08c379a0",
            "gasUsed": "0x5208",
            "error": { "code": -32015, "message": "execution reverted" }
        }]
    }]));

    let result = provider.simulate(&payload(), BlockNumberOrTag::Latest).await.unwrap();
    let CallResult::Failure { error_message, revert_data, .. } = &result.results[0] else {
        panic!("expected failure");
    };
    assert_eq!(error_message, "execution reverted");
    assert!(revert_data.is_some());
}
