use crate::BlockNumberOrTag;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// A value in a filter position that may be a single item or a list.
///
/// The wire accepts either form. Serialization emits a bare value for a
/// singleton, matching historical node behavior; an array otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueOrArray<T> {
    /// A single value.
    Value(T),
    /// A list of values, any of which matches.
    Array(Vec<T>),
}

impl<T> ValueOrArray<T> {
    /// Construct from a list, collapsing a singleton to the bare form.
    pub fn from_list(mut list: Vec<T>) -> Option<Self> {
        match list.len() {
            0 => None,
            1 => Some(Self::Value(list.remove(0))),
            _ => Some(Self::Array(list)),
        }
    }

    /// Iterate over the contained values.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::Value(value) => std::slice::from_ref(value).iter(),
            Self::Array(list) => list.iter(),
        }
    }
}

impl<T> From<T> for ValueOrArray<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// A log filter for `eth_getLogs` and `logs` subscriptions.
///
/// The topic list is an AND of ORs: position `i` must match one of the
/// values at `topics[i]`, with `null` as a wildcard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// The earliest block to search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockNumberOrTag>,
    /// The latest block to search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockNumberOrTag>,
    /// The emitting contract address(es).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ValueOrArray<Address>>,
    /// Per-position topic matchers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Option<ValueOrArray<B256>>>>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match logs from this block onward.
    pub const fn from_block(mut self, block: BlockNumberOrTag) -> Self {
        self.from_block = Some(block);
        self
    }

    /// Match logs up to this block.
    pub const fn to_block(mut self, block: BlockNumberOrTag) -> Self {
        self.to_block = Some(block);
        self
    }

    /// Match logs emitted by the given address.
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Match logs emitted by any of the given addresses. Internally a list;
    /// a single element serializes bare.
    pub fn addresses(mut self, addresses: Vec<Address>) -> Self {
        self.address = ValueOrArray::from_list(addresses);
        self
    }

    /// Match logs whose topic at `position` is one of `values`. Positions
    /// between existing matchers are filled with wildcards.
    pub fn topic(mut self, position: usize, values: Vec<B256>) -> Self {
        assert!(position < 4, "logs have at most 4 topics");
        let topics = self.topics.get_or_insert_with(Vec::new);
        while topics.len() <= position {
            topics.push(None);
        }
        topics[position] = ValueOrArray::from_list(values);
        self
    }

    /// Match logs with the given event signature hash as topic 0.
    pub fn event_signature(self, signature: B256) -> Self {
        self.topic(0, vec![signature])
    }
}
