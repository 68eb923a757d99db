use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// An Ethereum event log, as returned by `eth_getLogs` and carried in
/// receipts and `logs` subscriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// The contract that emitted the log.
    pub address: Address,
    /// The indexed topics. Zero to four entries; the first is usually the
    /// event signature hash.
    #[serde(default)]
    pub topics: Vec<B256>,
    /// The unindexed data of the log.
    #[serde(default)]
    pub data: Bytes,
    /// Hash of the block containing the log. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Number of the block containing the log. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub block_number: Option<u64>,
    /// Hash of the transaction that emitted the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// Index of the transaction within the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<U256>,
    /// Index of the log within the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<U256>,
    /// `true` when the log was removed by a chain reorganization.
    #[serde(default)]
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_getlogs_entry() {
        let json = r#"{
            "address": "0x3333333333333333333333333333333333333333",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x",
            "blockHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x12345",
            "transactionHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "transactionIndex": "0x0",
            "logIndex": "0x3",
            "removed": false
        }"#;
        let log: Log = serde_json::from_str(json).unwrap();
        assert_eq!(log.block_number, Some(0x12345));
        assert_eq!(log.topics.len(), 1);
        assert!(log.data.is_empty());
        assert!(!log.removed);
    }

    #[test]
    fn pending_log_has_absent_block_fields() {
        let json = r#"{
            "address": "0x3333333333333333333333333333333333333333",
            "topics": [],
            "data": "0x01"
        }"#;
        let log: Log = serde_json::from_str(json).unwrap();
        assert!(log.block_hash.is_none());
        assert!(log.block_number.is_none());
    }
}
