use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A block number or tag, as understood in block-parameter positions.
///
/// Serialized as `"latest" | "finalized" | "safe" | "earliest" | "pending"`
/// or as a minimal-hex block number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockNumberOrTag {
    /// The most recent block.
    #[default]
    Latest,
    /// The most recent crypto-economically finalized block.
    Finalized,
    /// The most recent block considered safe from re-orgs.
    Safe,
    /// The genesis block.
    Earliest,
    /// The pending state, including queued transactions.
    Pending,
    /// A block of the given height.
    Number(u64),
}

impl BlockNumberOrTag {
    /// Returns the block number, if this is a number variant.
    pub const fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` if this is the pending tag.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<u64> for BlockNumberOrTag {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for BlockNumberOrTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Finalized => f.write_str("finalized"),
            Self::Safe => f.write_str("safe"),
            Self::Earliest => f.write_str("earliest"),
            Self::Pending => f.write_str("pending"),
            Self::Number(n) => write!(f, "0x{n:x}"),
        }
    }
}

impl Serialize for BlockNumberOrTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockNumberOrTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "latest" => Ok(Self::Latest),
            "finalized" => Ok(Self::Finalized),
            "safe" => Ok(Self::Safe),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            hex => {
                let stripped = hex
                    .strip_prefix("0x")
                    .ok_or_else(|| serde::de::Error::custom("block number must be 0x-prefixed"))?;
                u64::from_str_radix(stripped, 16)
                    .map(Self::Number)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}

/// A block identifier: either a number/tag, or a block hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    /// A block number or tag.
    Number(BlockNumberOrTag),
    /// A block hash.
    Hash(B256),
}

impl Default for BlockId {
    fn default() -> Self {
        Self::Number(BlockNumberOrTag::Latest)
    }
}

impl From<BlockNumberOrTag> for BlockId {
    fn from(tag: BlockNumberOrTag) -> Self {
        Self::Number(tag)
    }
}

impl From<u64> for BlockId {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<B256> for BlockId {
    fn from(hash: B256) -> Self {
        Self::Hash(hash)
    }
}

/// An Ethereum block header, as seen over JSON-RPC.
///
/// Pre-London blocks carry no `baseFeePerGas`; the field stays absent and is
/// never zero-filled. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The block height.
    #[serde(with = "ferrite_serde::quantity")]
    pub number: u64,
    /// The unix timestamp of the block.
    #[serde(with = "ferrite_serde::quantity")]
    pub timestamp: u64,
    /// The beneficiary of the block's fees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner: Option<Address>,
    /// The protocol-burned per-gas fee. Absent pre-London.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// The gas limit of the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,
    /// The gas used by all transactions in the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
}

/// An Ethereum block, as returned by `eth_getBlockByNumber` and
/// `eth_getBlockByHash` with transaction hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The block header fields, flattened into the block object.
    #[serde(flatten)]
    pub header: Header,
    /// The hashes of the block's transactions.
    #[serde(default)]
    pub transactions: Vec<B256>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_serialization() {
        assert_eq!(serde_json::to_string(&BlockNumberOrTag::Latest).unwrap(), "\"latest\"");
        assert_eq!(serde_json::to_string(&BlockNumberOrTag::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&BlockNumberOrTag::Safe).unwrap(), "\"safe\"");
        // Minimal hex, no leading zeros.
        assert_eq!(serde_json::to_string(&BlockNumberOrTag::Number(0)).unwrap(), "\"0x0\"");
        assert_eq!(
            serde_json::to_string(&BlockNumberOrTag::Number(0x4321)).unwrap(),
            "\"0x4321\""
        );
    }

    #[test]
    fn tag_round_trip() {
        for tag in ["\"latest\"", "\"finalized\"", "\"safe\"", "\"earliest\"", "\"pending\"", "\"0x1b4\""]
        {
            let parsed: BlockNumberOrTag = serde_json::from_str(tag).unwrap();
            assert_eq!(serde_json::to_string(&parsed).unwrap(), tag);
        }
    }

    #[test]
    fn pre_london_block_has_no_base_fee() {
        let json = r#"{
            "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "number": "0xf4240",
            "timestamp": "0x5f5e100",
            "gasLimit": "0x7a1200",
            "gasUsed": "0x5208",
            "extraneous": "ignored"
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.header.number, 1_000_000);
        assert!(block.header.base_fee_per_gas.is_none());
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn post_london_block_base_fee() {
        let json = r#"{
            "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "number": "0xt",
            "timestamp": "0x5f5e100"
        }"#;
        assert!(serde_json::from_str::<Block>(json).is_err());

        let json = r#"{
            "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "parentHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "number": "0x10",
            "timestamp": "0x5f5e100",
            "baseFeePerGas": "0x3b9aca00"
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.header.base_fee_per_gas, Some(U256::from(1_000_000_000u64)));
    }
}
