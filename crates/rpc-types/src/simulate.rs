//! `eth_simulateV1` request and response types.

use crate::{Log, StateOverride, TransactionRequest, TxValidationError};
use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};

/// A single call inside a simulation request.
///
/// This is a [`TransactionRequest`] restricted by the simulation rules: a
/// recipient is required, and the fee mutual-exclusion invariant is
/// re-checked at encode time.
pub type SimulateCall = TransactionRequest;

/// A batch of calls simulated against one block state, with optional account
/// overrides applied before execution.
///
/// `stateOverrides` is a direct child of this object on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStateCall {
    /// The calls to execute sequentially.
    pub calls: Vec<SimulateCall>,
    /// Account overrides applied before executing the calls.
    #[serde(default, skip_serializing_if = "StateOverride::is_empty")]
    pub state_overrides: StateOverride,
}

/// The first positional parameter of `eth_simulateV1`.
///
/// `validation` is always serialized, including when `false`; the node
/// defaults are not relied upon. The block tag travels as the second
/// positional parameter, not in this object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatePayload {
    /// The batches of calls to simulate.
    pub block_state_calls: Vec<BlockStateCall>,
    /// Whether to trace asset (balance) changes.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trace_asset_changes: bool,
    /// Whether to trace ETH and token transfers as synthetic logs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trace_transfers: bool,
    /// Whether the node validates the call sequence as a real block would.
    #[serde(default = "default_validation")]
    pub validation: bool,
}

const fn default_validation() -> bool {
    true
}

impl Default for SimulatePayload {
    fn default() -> Self {
        Self {
            block_state_calls: Vec::new(),
            trace_asset_changes: false,
            trace_transfers: false,
            validation: true,
        }
    }
}

impl SimulatePayload {
    /// Create a payload simulating the given calls against one block state.
    pub fn new(calls: Vec<SimulateCall>) -> Self {
        Self {
            block_state_calls: vec![BlockStateCall { calls, state_overrides: Default::default() }],
            ..Default::default()
        }
    }

    /// Apply account overrides to the (single) block state.
    pub fn with_state_overrides(mut self, overrides: StateOverride) -> Self {
        if let Some(block) = self.block_state_calls.last_mut() {
            block.state_overrides = overrides;
        }
        self
    }

    /// Enable asset-change tracing.
    pub fn with_trace_asset_changes(mut self, trace: bool) -> Self {
        self.trace_asset_changes = trace;
        self
    }

    /// Enable transfer tracing.
    pub fn with_trace_transfers(mut self, trace: bool) -> Self {
        self.trace_transfers = trace;
        self
    }

    /// Set whether the node validates the call sequence.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Check the payload's encode-time invariants: at least one call, a
    /// recipient on every call, per-call fee mutual exclusion, and valid
    /// account overrides.
    pub fn validate(&self) -> Result<(), TxValidationError> {
        if self.block_state_calls.is_empty() {
            return Err(TxValidationError::EmptyCalls);
        }
        for block in &self.block_state_calls {
            if block.calls.is_empty() {
                return Err(TxValidationError::EmptyCalls);
            }
            for call in &block.calls {
                if call.to.is_none() {
                    return Err(TxValidationError::MissingRecipient);
                }
                if call.gas_price.is_some()
                    && (call.max_fee_per_gas.is_some() || call.max_priority_fee_per_gas.is_some())
                {
                    return Err(TxValidationError::ConflictingFeeFields);
                }
            }
        }
        Ok(())
    }
}

/// A single call outcome inside a simulated block, as returned by the node.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimCallResult {
    /// The execution status: `0x1` success, `0x0` failure. Some nodes omit
    /// it for successful calls.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub status: Option<u64>,
    /// The raw bytes returned by the call.
    #[serde(default)]
    pub return_data: Bytes,
    /// The amount of gas used by the call.
    #[serde(default)]
    pub gas_used: U256,
    /// Logs emitted during execution.
    #[serde(default)]
    pub logs: Vec<Log>,
    /// The error, in case the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SimulateError>,
}

/// The error object attached to a failed simulated call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulateError {
    /// The error code, e.g. `-32015` for a VM error.
    #[serde(default)]
    pub code: i64,
    /// The error message.
    #[serde(default)]
    pub message: String,
}

/// One simulated block of the `eth_simulateV1` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedBlock {
    /// Per-call outcomes, in request order.
    #[serde(default)]
    pub calls: Vec<SimCallResult>,
    /// Asset-change deltas, present when tracing was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_changes: Option<Vec<AssetChange>>,
}

/// The parsed outcome of a single simulated call.
#[derive(Clone, Debug)]
pub enum CallResult {
    /// The call executed successfully.
    Success {
        /// Gas used by the call.
        gas_used: U256,
        /// The returned bytes.
        return_data: Bytes,
        /// Logs emitted during execution.
        logs: Vec<Log>,
    },
    /// The call failed.
    Failure {
        /// Gas used by the call.
        gas_used: U256,
        /// A human-readable failure description.
        error_message: String,
        /// The revert payload, when the call reverted with data.
        revert_data: Option<Bytes>,
    },
}

impl CallResult {
    /// Returns `true` if the call succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<SimCallResult> for CallResult {
    fn from(raw: SimCallResult) -> Self {
        let failed = raw.error.is_some() || raw.status == Some(0);
        if failed {
            let error_message = raw
                .error
                .map(|err| err.message)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| "execution failed".to_string());
            let revert_data = (!raw.return_data.is_empty()).then_some(raw.return_data);
            Self::Failure { gas_used: raw.gas_used, error_message, revert_data }
        } else {
            Self::Success {
                gas_used: raw.gas_used,
                return_data: raw.return_data,
                logs: raw.logs,
            }
        }
    }
}

/// The parsed result of a simulation: one entry per call, plus asset-change
/// deltas when tracing was enabled.
#[derive(Clone, Debug, Default)]
pub struct SimulateResult {
    /// Per-call outcomes, in request order.
    pub results: Vec<CallResult>,
    /// Asset-change deltas.
    pub asset_changes: Option<Vec<AssetChange>>,
}

impl From<SimulatedBlock> for SimulateResult {
    fn from(block: SimulatedBlock) -> Self {
        Self {
            results: block.calls.into_iter().map(Into::into).collect(),
            asset_changes: block.asset_changes,
        }
    }
}

/// Identity of a token involved in an asset change. Native ETH is reported
/// with the zero address.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The token contract address.
    pub address: Address,
    /// The token symbol, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// The token decimals, if known.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub decimals: Option<u8>,
}

/// The balance movement of one account in one asset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDelta {
    /// Balance before the simulated calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<U256>,
    /// Balance after the simulated calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<U256>,
    /// The signed difference.
    pub diff: I256,
}

/// An asset-change entry of a simulated block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetChange {
    /// The asset that moved.
    pub token: TokenInfo,
    /// The balance movement.
    pub value: AssetDelta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateOverridesBuilder;
    use alloy_primitives::address;
    use similar_asserts::assert_eq;

    #[test]
    fn encodes_spec_shape() {
        let call = SimulateCall::default()
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

        let payload = SimulatePayload::new(vec![call])
            .with_state_overrides(overrides)
            .with_trace_asset_changes(true);
        payload.validate().unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
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
            })
        );
        // `stateOverrides` is a direct child of the block-state call; no
        // wrapper object appears anywhere in the encoding.
        assert!(!json.to_string().contains("blockState\""));
    }

    #[test]
    fn validation_false_is_still_serialized() {
        let call = SimulateCall::default()
            .with_to(address!("2222222222222222222222222222222222222222"));
        let payload = SimulatePayload::new(vec![call]).with_validation(false);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["validation"], false);
    }

    #[test]
    fn rejects_empty_call_lists() {
        // A payload with no block-state calls at all.
        let bare = SimulatePayload::default();
        assert_eq!(bare.validate(), Err(TxValidationError::EmptyCalls));

        // And one whose single block has nothing to execute.
        let hollow = SimulatePayload::new(vec![]);
        assert_eq!(hollow.validate(), Err(TxValidationError::EmptyCalls));
    }

    #[test]
    fn per_call_fee_exclusion_is_enforced_at_encode_time() {
        let call = SimulateCall::default()
            .with_to(address!("2222222222222222222222222222222222222222"))
            .with_gas_price(1)
            .with_max_fee_per_gas(2);
        let payload = SimulatePayload::new(vec![call]);
        assert_eq!(payload.validate(), Err(TxValidationError::ConflictingFeeFields));
    }

    #[test]
    fn parses_success_and_failure_results() {
        let json = r#"{
            "number": "0x1",
            "calls": [
                { "status": "0x1", "returnData": "0xabcd", "gasUsed": "0x5208", "logs": [] },
                { "status": "0x0", "returnData": "0x08c379a0", "gasUsed": "0x5208",
                  "error": { "code": -32015, "message": "execution reverted" } },
                { "status": "0x0", "returnData": "0x", "gasUsed": "0x0" }
            ]
        }"#;
        let block: SimulatedBlock = serde_json::from_str(json).unwrap();
        let result = SimulateResult::from(block);
        assert_eq!(result.results.len(), 3);

        assert!(result.results[0].is_success());

        let CallResult::Failure { error_message, revert_data, .. } = &result.results[1] else {
            panic!("expected failure");
        };
        assert_eq!(error_message, "execution reverted");
        assert!(revert_data.is_some());

        // No error object, zero status: the fallback message applies and the
        // empty return data yields no revert payload.
        let CallResult::Failure { error_message, revert_data, .. } = &result.results[2] else {
            panic!("expected failure");
        };
        assert_eq!(error_message, "execution failed");
        assert!(revert_data.is_none());
    }

    #[test]
    fn success_with_absent_status() {
        let raw: SimCallResult =
            serde_json::from_str(r#"{ "returnData": "0x01", "gasUsed": "0x1" }"#).unwrap();
        assert!(CallResult::from(raw).is_success());
    }
}
