use crate::common::{mocked, RecordingSigner, SIGNER_ADDRESS};
use alloy_primitives::{address, b256, U256};
use ferrite_provider::{ChainProfile, TxError, WalletProvider};
use ferrite_rpc_types::TransactionRequest;
use std::time::Duration;

fn recipient() -> alloy_primitives::Address {
    address!("2222222222222222222222222222222222222222")
}

#[tokio::test]
async fn legacy_auto_fill_pipeline() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    // chain check, nonce, gas estimate, submission, in pipeline order.
    asserter.push_success(&"0x1");
    asserter.push_success(&"0x5");
    asserter.push_success(&"0x5208");
    asserter
        .push_success(&"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_gas_price(1_000_000_000)
        .with_value(U256::ZERO);
    let pending = wallet.send_transaction(req).await.unwrap();

    assert_eq!(
        pending.tx_hash(),
        b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
    );

    let signed = signer.last_signed().unwrap();
    assert_eq!(signed.nonce, Some(5));
    // 0x5208 = 21000, buffered by 120/100.
    assert_eq!(signed.gas_limit, Some(25_200));
    assert_eq!(signed.gas_price, Some(1_000_000_000));
    assert_eq!(signed.from, Some(SIGNER_ADDRESS));
    assert_eq!(signed.chain_id, Some(1));

    let methods: Vec<_> =
        asserter.recorded_requests().into_iter().map(|req| req.method).collect();
    assert_eq!(
        methods,
        ["eth_chainId", "eth_getTransactionCount", "eth_estimateGas", "eth_sendRawTransaction"]
    );
    // The nonce comes from the pending count.
    let recorded = asserter.recorded_requests();
    assert_eq!(
        recorded[1].params,
        Some(serde_json::json!(["0x1111111111111111111111111111111111111111", "pending"]))
    );
}

#[tokio::test]
async fn chain_mismatch_fails_before_signing() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    asserter.push_success(&"0x2");

    let req = TransactionRequest::new().with_to(recipient()).with_value(U256::ZERO);
    let err = wallet.send_transaction(req).await.unwrap_err();
    assert!(
        matches!(err, TxError::ChainMismatch { expected: 1, actual: 2 }),
        "expected ChainMismatch, got {err}"
    );
    assert_eq!(signer.sign_count(), 0);
}

#[tokio::test]
async fn eip1559_fees_derive_from_base_fee() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    asserter.push_success(&"0x1"); // chain id
    asserter.push_success(&"0x0"); // nonce
    asserter.push_success(&serde_json::json!({
        "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
        "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
        "number": "0x10",
        "timestamp": "0x64",
        "baseFeePerGas": "0x3b9aca00"
    })); // latest block, 1 gwei base fee
    asserter.push_success(&"0x5208"); // estimate
    asserter
        .push_success(&"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    let req = TransactionRequest::new().with_to(recipient()).with_value(U256::ZERO);
    let _ = wallet.send_transaction(req).await.unwrap();

    let signed = signer.last_signed().unwrap();
    // Default tip of 1 gwei; cap of 2 * base + tip = 3 gwei.
    assert_eq!(signed.max_priority_fee_per_gas, Some(1_000_000_000));
    assert_eq!(signed.max_fee_per_gas, Some(3_000_000_000));
    assert_eq!(signed.gas_price, None);
}

#[tokio::test]
async fn pre_london_falls_back_to_legacy() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    asserter.push_success(&"0x1"); // chain id
    asserter.push_success(&"0x0"); // nonce
    asserter.push_success(&serde_json::json!({
        "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
        "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
        "number": "0x10",
        "timestamp": "0x64"
    })); // pre-London block: no base fee
    asserter.push_success(&"0x77359400"); // eth_gasPrice: 2 gwei
    asserter.push_success(&"0x5208"); // estimate
    asserter
        .push_success(&"0xcccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc");

    let req = TransactionRequest::new().with_to(recipient()).with_value(U256::ZERO);
    let _ = wallet.send_transaction(req).await.unwrap();

    let signed = signer.last_signed().unwrap();
    assert_eq!(signed.gas_price, Some(2_000_000_000));
    assert_eq!(signed.max_fee_per_gas, None);

    let methods: Vec<_> =
        asserter.recorded_requests().into_iter().map(|req| req.method).collect();
    assert!(methods.contains(&"eth_gasPrice".to_string()));
}

#[tokio::test]
async fn explicit_fields_are_never_overwritten() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    asserter.push_success(&"0x1"); // chain id only: everything else is explicit
    asserter
        .push_success(&"0xdddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd");

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_value(U256::ZERO)
        .with_nonce(7)
        .with_gas_limit(30_000)
        .with_max_fee_per_gas(5_000_000_000)
        .with_max_priority_fee_per_gas(2_000_000_000);
    let _ = wallet.send_transaction(req).await.unwrap();

    let signed = signer.last_signed().unwrap();
    assert_eq!(signed.nonce, Some(7));
    assert_eq!(signed.gas_limit, Some(30_000));
    assert_eq!(signed.max_fee_per_gas, Some(5_000_000_000));
    assert_eq!(signed.max_priority_fee_per_gas, Some(2_000_000_000));

    let methods: Vec<_> =
        asserter.recorded_requests().into_iter().map(|req| req.method).collect();
    assert_eq!(methods, ["eth_chainId", "eth_sendRawTransaction"]);
}

#[tokio::test]
async fn blob_fee_is_resolved_before_gas_estimation() {
    use ferrite_eips::eip4844::{Blob, KzgCommitment, KzgProof};
    use ferrite_rpc_types::{BlobTransactionRequest, BlobTransactionSidecar};

    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer.clone(), ChainProfile::new(1));

    asserter.push_success(&"0x1"); // chain id
    asserter.push_success(&"0x0"); // nonce
    asserter.push_success(&"0x1"); // blob base fee
    asserter.push_success(&"0x5208"); // estimate
    asserter
        .push_success(&"0x9999999999999999999999999999999999999999999999999999999999999999");

    let sidecar = BlobTransactionSidecar::new(
        vec![Blob::ZERO],
        vec![KzgCommitment::ZERO],
        vec![KzgProof::ZERO],
    );
    let tx = TransactionRequest::new()
        .with_to(recipient())
        .with_max_fee_per_gas(3_000_000_000)
        .with_max_priority_fee_per_gas(1_000_000_000);
    let _ = wallet.send_blob_transaction(BlobTransactionRequest::new(tx, sidecar)).await.unwrap();

    // Step order: chain check, nonce, fees (explicit, no call), blob fee,
    // gas estimate, submission.
    let methods: Vec<_> =
        asserter.recorded_requests().into_iter().map(|req| req.method).collect();
    assert_eq!(
        methods,
        [
            "eth_chainId",
            "eth_getTransactionCount",
            "eth_blobBaseFee",
            "eth_estimateGas",
            "eth_sendRawTransaction"
        ]
    );

    let signed = signer.last_signed_blob().unwrap();
    // max(2 * blob base fee, profile floor).
    assert_eq!(signed.max_fee_per_blob_gas, Some(2));
    assert_eq!(signed.tx.gas_limit, Some(25_200));
    assert_eq!(signed.blob_versioned_hashes.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn conflicting_fees_are_rejected_locally() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer, ChainProfile::new(1));
    asserter.push_success(&"0x1");

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_gas_price(1)
        .with_max_fee_per_gas(2);
    let err = wallet.send_transaction(req).await.unwrap_err();
    assert!(matches!(err, TxError::Validation(_)), "expected Validation, got {err}");
}

#[tokio::test]
async fn send_and_wait_polls_until_mined() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer, ChainProfile::new(1));

    asserter.push_success(&"0x1"); // chain id
    asserter.push_success(&"0x0"); // nonce
    asserter.push_success(&"0x5208"); // estimate
    asserter
        .push_success(&"0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
    // Two polls miss, the third hits.
    asserter.push_success(&serde_json::Value::Null);
    asserter.push_success(&serde_json::Value::Null);
    asserter.push_success(&serde_json::json!({
        "transactionHash": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
        "blockNumber": "0xa",
        "status": "0x1",
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "logs": []
    }));

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_gas_price(1_000_000_000)
        .with_value(U256::ZERO);
    let receipt = wallet
        .send_transaction_and_wait(req, Duration::from_secs(5), Duration::from_millis(10))
        .await
        .unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.block_number, Some(10));
}

#[tokio::test]
async fn receipt_wait_times_out() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer, ChainProfile::new(1));

    asserter.push_success(&"0x1");
    asserter.push_success(&"0x0");
    asserter.push_success(&"0x5208");
    asserter
        .push_success(&"0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
    for _ in 0..32 {
        asserter.push_success(&serde_json::Value::Null);
    }

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_gas_price(1_000_000_000)
        .with_value(U256::ZERO);
    let err = wallet
        .send_transaction_and_wait(req, Duration::from_millis(60), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, TxError::ReceiptTimeout { .. }), "expected ReceiptTimeout, got {err}");
}

#[tokio::test]
async fn submit_errors_are_classified() {
    let (provider, asserter) = mocked();
    let signer = RecordingSigner::default();
    let wallet = WalletProvider::new(provider, signer, ChainProfile::new(1));

    asserter.push_success(&"0x1");
    asserter.push_success(&"0x0");
    asserter.push_success(&"0x5208");
    asserter.push_failure(ferrite_json_rpc::ErrorPayload {
        code: -32000,
        message: "nonce too low: next nonce 6, tx nonce 0".into(),
        data: None,
    });

    let req = TransactionRequest::new()
        .with_to(recipient())
        .with_gas_price(1_000_000_000)
        .with_value(U256::ZERO);
    let err = wallet.send_transaction(req).await.unwrap_err();
    assert!(matches!(err, TxError::NonceTooLow(_)), "expected NonceTooLow, got {err}");
}
