use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

mod receipt;
pub use receipt::TransactionReceipt;

mod request;
pub use request::{BlobTransactionRequest, TransactionRequest, TxValidationError};

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The transaction hash.
    pub hash: B256,
    /// The sender's nonce.
    #[serde(with = "ferrite_serde::quantity")]
    pub nonce: u64,
    /// Hash of the containing block. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Number of the containing block. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub block_number: Option<u64>,
    /// Index within the containing block. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub transaction_index: Option<u64>,
    /// The sender.
    pub from: Address,
    /// The recipient. `None` for contract creations.
    #[serde(default)]
    pub to: Option<Address>,
    /// The transferred value, in wei.
    #[serde(default)]
    pub value: U256,
    /// The gas limit.
    #[serde(with = "ferrite_serde::quantity")]
    pub gas: u64,
    /// Legacy gas price, or the effective gas price once mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// EIP-1559 fee cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 priority fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// The calldata.
    #[serde(default)]
    pub input: Bytes,
    /// The EIP-2718 transaction type.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        with = "ferrite_serde::quantity::opt"
    )]
    pub transaction_type: Option<u8>,
}
