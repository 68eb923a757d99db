use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A list of addresses and storage keys that a transaction plans to access.
///
/// Pre-declaring accesses (EIP-2930) makes them cheaper at execution time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList(pub Vec<AccessListItem>);

impl AccessList {
    /// Returns `true` if the access list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, AccessListItem> {
        self.0.iter()
    }
}

impl From<Vec<AccessListItem>> for AccessList {
    fn from(items: Vec<AccessListItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<AccessListItem> for AccessList {
    fn from_iter<T: IntoIterator<Item = AccessListItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single access-list entry: an account and the storage keys touched in it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    /// The accessed account.
    pub address: Address,
    /// The accessed storage keys.
    pub storage_keys: Vec<B256>,
}

/// The result of `eth_createAccessList`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListResult {
    /// The created access list.
    pub access_list: AccessList,
    /// Gas used when the access list is included.
    pub gas_used: U256,
    /// Error raised while creating the list, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessListResult {
    /// Converts the result into an error if the node reported one.
    pub fn ensure_ok(self) -> Result<Self, String> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn access_list_wire_shape() {
        let list = AccessList(vec![AccessListItem {
            address: address!("2222222222222222222222222222222222222222"),
            storage_keys: vec![B256::ZERO],
        }]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "address": "0x2222222222222222222222222222222222222222",
                "storageKeys": [
                    "0x0000000000000000000000000000000000000000000000000000000000000000"
                ]
            }])
        );
    }
}
