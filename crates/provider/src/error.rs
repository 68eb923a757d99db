use alloy_primitives::Bytes;
use ferrite_rpc_types::TxValidationError;
use ferrite_signer::SignerError;
use ferrite_transport::TransportError;
use std::time::Duration;

/// The provider has been closed; no further operations are possible.
#[derive(Clone, Copy, Debug, Default, thiserror::Error)]
#[error("client has been closed")]
pub struct ClientClosed;

/// The impersonation session has been closed; no further operations are
/// possible through it.
#[derive(Clone, Copy, Debug, Default, thiserror::Error)]
#[error("impersonation session has been closed")]
pub struct SessionClosed;

/// Errors raised by [`Provider::simulate`](crate::Provider::simulate).
#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    /// The node does not implement `eth_simulateV1`.
    ///
    /// This is terminal: the call is never retried.
    #[error(
        "the node does not support eth_simulateV1; point the client at a node that does \
         (recent Geth or Reth, Anvil, or a managed endpoint advertising eth_simulateV1 support)"
    )]
    NotSupported,

    /// The request violated a build invariant before reaching the wire.
    #[error(transparent)]
    Validation(#[from] TxValidationError),

    /// The node returned no simulated block.
    #[error("the node returned an empty simulation result")]
    EmptyResponse,

    /// Any other RPC or transport failure.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for SimulateError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) if payload.is_method_not_found() => Self::NotSupported,
            _ => Self::Transport(err),
        }
    }
}

/// Errors raised by the transaction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// The configured chain and the node disagree. Raised before anything is
    /// signed.
    #[error("configured chain id {expected} does not match the node's chain id {actual}")]
    ChainMismatch {
        /// The configured chain id.
        expected: u64,
        /// The chain id the node reported.
        actual: u64,
    },

    /// The request violated a build invariant.
    #[error(transparent)]
    Validation(#[from] TxValidationError),

    /// The signer refused or failed.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// The node rejected the sender.
    #[error("invalid sender: {0}")]
    InvalidSender(String),

    /// The transaction's nonce is below the account's current nonce.
    #[error("nonce too low: {0}")]
    NonceTooLow(String),

    /// The transaction's nonce is ahead of the account's current nonce.
    #[error("nonce too high: {0}")]
    NonceTooHigh(String),

    /// The sender cannot cover value + gas.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The node already knows this transaction.
    #[error("already known: {0}")]
    AlreadyKnown(String),

    /// Execution reverted while estimating or submitting.
    #[error("execution reverted{}", decoded.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Revert {
        /// The raw revert payload, if the node returned one.
        data: Option<Bytes>,
        /// The decoded `Error(string)` message, when the payload carries one.
        decoded: Option<String>,
    },

    /// No receipt appeared before the deadline.
    #[error("transaction was not mined within {:?}", timeout)]
    ReceiptTimeout {
        /// The configured wait budget.
        timeout: Duration,
    },

    /// The provider has been closed.
    #[error(transparent)]
    Closed(#[from] ClientClosed),

    /// Any other RPC or transport failure.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for TxError {
    fn from(err: TransportError) -> Self {
        let Some(payload) = err.as_error_resp() else {
            return Self::Transport(err);
        };

        if let Some(data) = payload.as_revert_data() {
            let decoded = crate::utils::decode_revert_reason(&data);
            return Self::Revert { data: Some(data), decoded };
        }

        let msg = payload.message.to_ascii_lowercase();
        if msg.contains("execution reverted") {
            return Self::Revert { data: None, decoded: None };
        }
        if msg.contains("invalid sender") {
            return Self::InvalidSender(payload.message.clone());
        }
        if msg.contains("nonce too low") {
            return Self::NonceTooLow(payload.message.clone());
        }
        if msg.contains("nonce too high") {
            return Self::NonceTooHigh(payload.message.clone());
        }
        if msg.contains("insufficient funds") {
            return Self::InsufficientFunds(payload.message.clone());
        }
        if msg.contains("already known") {
            return Self::AlreadyKnown(payload.message.clone());
        }

        Self::Transport(err)
    }
}

/// Errors raised by the test-node admin surface.
#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    /// The operation is not available on the configured node kind.
    #[error("`{operation}` is not supported on {mode:?} nodes")]
    UnsupportedOnNodeKind {
        /// The attempted operation.
        operation: &'static str,
        /// The configured node kind.
        mode: crate::TestNodeMode,
    },

    /// The node produced a malformed snapshot id.
    #[error(transparent)]
    InvalidSnapshotId(#[from] ferrite_rpc_types::SnapshotIdError),

    /// The impersonation session has been closed.
    #[error(transparent)]
    SessionClosed(#[from] SessionClosed),

    /// The provider has been closed.
    #[error(transparent)]
    Closed(#[from] ClientClosed),

    /// Any other RPC or transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_json_rpc::{ErrorPayload, RpcError};

    fn resp_err(code: i64, message: &str, data: Option<&str>) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: data
                .map(|d| serde_json::value::RawValue::from_string(format!("\"{d}\"")).unwrap()),
        })
    }

    #[test]
    fn classifies_send_errors() {
        assert!(matches!(
            TxError::from(resp_err(-32000, "invalid sender", None)),
            TxError::InvalidSender(_)
        ));
        assert!(matches!(
            TxError::from(resp_err(-32000, "Nonce too LOW", None)),
            TxError::NonceTooLow(_)
        ));
        assert!(matches!(
            TxError::from(resp_err(-32000, "insufficient funds for gas * price + value", None)),
            TxError::InsufficientFunds(_)
        ));
        assert!(matches!(
            TxError::from(resp_err(-32000, "already known", None)),
            TxError::AlreadyKnown(_)
        ));
        assert!(matches!(
            TxError::from(resp_err(-32000, "some other failure", None)),
            TxError::Transport(_)
        ));
    }

    #[test]
    fn decodes_standard_revert() {
        // Error("oops"): selector + offset + length + padded payload.
        let data = concat!(
            "0x08c379a0",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "6f6f707300000000000000000000000000000000000000000000000000000000",
        );
        let err = TxError::from(resp_err(3, "execution reverted", Some(data)));
        let TxError::Revert { data, decoded } = err else { panic!("expected revert") };
        assert!(data.is_some());
        assert_eq!(decoded.as_deref(), Some("oops"));
    }

    #[test]
    fn method_not_found_is_simulate_not_supported() {
        let err = SimulateError::from(resp_err(-32601, "Method not found", None));
        assert!(matches!(err, SimulateError::NotSupported));
        assert!(err.to_string().contains("eth_simulateV1"));
    }
}
