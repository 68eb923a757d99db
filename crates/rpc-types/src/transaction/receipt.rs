use crate::Log;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A transaction receipt, as returned by `eth_getTransactionReceipt`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// The hash of the transaction.
    pub transaction_hash: B256,
    /// Hash of the containing block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Number of the containing block.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub block_number: Option<u64>,
    /// `true` if execution succeeded.
    #[serde(default, with = "ferrite_serde::quantity")]
    pub status: bool,
    /// Total gas used in the block up to and including this transaction.
    pub cumulative_gas_used: U256,
    /// Gas used by this transaction alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    /// The address created, if the transaction was a contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// The logs emitted by this transaction.
    #[serde(default)]
    pub logs: Vec<Log>,
    /// The actual per-gas price paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    /// The EIP-2718 transaction type.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        with = "ferrite_serde::quantity::opt"
    )]
    pub transaction_type: Option<u8>,
}

impl TransactionReceipt {
    /// Returns `true` if execution succeeded.
    pub const fn is_success(&self) -> bool {
        self.status
    }
}
