use crate::common::mocked;
use alloy_primitives::{address, U256};
use ferrite_provider::{Provider, TesterError, TestNodeMode, Tester};
use ferrite_rpc_types::BlockId;

fn account() -> alloy_primitives::Address {
    address!("4444444444444444444444444444444444444444")
}

#[tokio::test]
async fn admin_methods_use_node_kind_prefix() {
    for (mode, expected) in [
        (TestNodeMode::Anvil, "anvil_setBalance"),
        (TestNodeMode::Hardhat, "hardhat_setBalance"),
        (TestNodeMode::Ganache, "evm_setBalance"),
    ] {
        let (provider, asserter) = mocked();
        let tester = Tester::new(provider, mode);
        asserter.push_success(&serde_json::Value::Null);
        tester.set_balance(account(), U256::from(1u64)).await.unwrap();
        assert_eq!(asserter.recorded_requests()[0].method, expected);
    }
}

#[tokio::test]
async fn snapshot_methods_use_time_prefix() {
    for (mode, expected) in [
        (TestNodeMode::Anvil, "evm_snapshot"),
        (TestNodeMode::Ganache, "evm_snapshot"),
        (TestNodeMode::Hardhat, "hardhat_snapshot"),
    ] {
        let (provider, asserter) = mocked();
        let tester = Tester::new(provider, mode);
        asserter.push_success(&"0x1");
        let id = tester.snapshot().await.unwrap();
        assert_eq!(id.as_str(), "0x1");
        assert_eq!(asserter.recorded_requests()[0].method, expected);
    }
}

#[tokio::test]
async fn snapshot_rejects_malformed_ids() {
    let (provider, asserter) = mocked();
    let tester = Tester::new(provider, TestNodeMode::Anvil);
    asserter.push_success(&"not-hex");
    let err = tester.snapshot().await.unwrap_err();
    assert!(matches!(err, TesterError::InvalidSnapshotId(_)), "got {err}");
}

#[tokio::test]
async fn snapshot_set_balance_revert_round_trip() {
    let (provider, asserter) = mocked();
    let tester = Tester::new(provider, TestNodeMode::Anvil);
    let original = U256::from(0x64u64);

    asserter.push_success(&"0x64"); // balance before
    asserter.push_success(&"0x1"); // snapshot
    asserter.push_success(&serde_json::Value::Null); // setBalance ack
    asserter.push_success(&true); // revert
    asserter.push_success(&"0x64"); // balance after revert

    let before = tester.inner().get_balance(account(), BlockId::default()).await.unwrap();
    let snapshot = tester.snapshot().await.unwrap();
    tester
        .set_balance(account(), U256::from(999u64) * U256::from(10u64).pow(U256::from(18u64)))
        .await
        .unwrap();
    assert!(tester.revert(&snapshot).await.unwrap());
    let after = tester.inner().get_balance(account(), BlockId::default()).await.unwrap();

    assert_eq!(before, original);
    assert_eq!(after, before);

    let methods: Vec<_> =
        asserter.recorded_requests().into_iter().map(|req| req.method).collect();
    assert_eq!(
        methods,
        ["eth_getBalance", "evm_snapshot", "anvil_setBalance", "evm_revert", "eth_getBalance"]
    );
    // The snapshot id is passed back verbatim.
    assert_eq!(
        asserter.recorded_requests()[3].params,
        Some(serde_json::json!(["0x1"]))
    );
}

#[tokio::test]
async fn anvil_only_operations_are_guarded() {
    let (provider, asserter) = mocked();
    let tester = Tester::new(provider, TestNodeMode::Hardhat);

    let err = tester.dump_state().await.unwrap_err();
    assert!(
        matches!(
            err,
            TesterError::UnsupportedOnNodeKind { operation: "dumpState", mode: TestNodeMode::Hardhat }
        ),
        "got {err}"
    );
    let err = tester.enable_auto_impersonate().await.unwrap_err();
    assert!(matches!(err, TesterError::UnsupportedOnNodeKind { .. }), "got {err}");

    // Nothing reached the wire.
    assert!(asserter.recorded_requests().is_empty());
}

#[tokio::test]
async fn impersonation_session_lifecycle() {
    let (provider, asserter) = mocked();
    let tester = Tester::new(provider, TestNodeMode::Anvil);

    asserter.push_success(&serde_json::Value::Null); // impersonateAccount
    let session = tester.impersonate(account()).await.unwrap();

    // The session overwrites `from` with the impersonated address.
    asserter
        .push_success(&"0x1111111111111111111111111111111111111111111111111111111111111111");
    let req = ferrite_rpc_types::TransactionRequest::new()
        .with_from(address!("9999999999999999999999999999999999999999"))
        .with_to(account())
        .with_value(U256::from(1u64));
    session.send_transaction(req).await.unwrap();

    let recorded = asserter.recorded_requests();
    assert_eq!(recorded[1].method, "eth_sendTransaction");
    assert_eq!(
        recorded[1].params.as_ref().unwrap()[0]["from"],
        "0x4444444444444444444444444444444444444444"
    );

    // Close is idempotent: one stopImpersonatingAccount, ever.
    asserter.push_success(&serde_json::Value::Null);
    session.close().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(
        asserter.recorded_requests().last().unwrap().method,
        "anvil_stopImpersonatingAccount"
    );
    assert_eq!(asserter.recorded_requests().len(), 3);

    // Operations after close fail.
    let err = session
        .send_transaction(ferrite_rpc_types::TransactionRequest::new().with_to(account()))
        .await
        .unwrap_err();
    assert!(matches!(err, TesterError::SessionClosed(_)), "got {err}");
}

#[tokio::test]
async fn mine_passes_interval_when_present() {
    let (provider, asserter) = mocked();
    let tester = Tester::new(provider, TestNodeMode::Anvil);

    asserter.push_success(&serde_json::Value::Null);
    tester.mine(3, Some(12)).await.unwrap();
    let recorded = asserter.recorded_requests();
    assert_eq!(recorded[0].method, "evm_mine");
    assert_eq!(recorded[0].params, Some(serde_json::json!(["0x3", "0xc"])));
}
