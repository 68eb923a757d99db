//! Bindings for state overrides in `eth_call` and `eth_simulateV1`.

use alloy_primitives::{
    map::{AddressHashMap, B256HashMap},
    Address, Bytes, B256, U256,
};
use serde::{Deserialize, Serialize};

/// A set of account overrides, keyed by address.
pub type StateOverride = AddressHashMap<AccountOverride>;

/// Error raised when an override violates a wire invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    /// `state` replaces the whole storage, `stateDiff` patches it; a single
    /// account cannot do both.
    #[error("`state` and `stateDiff` are mutually exclusive for an account")]
    ConflictingStorageOverride,
}

/// Custom account override used in `eth_call` and simulation requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountOverride {
    /// Fake balance to set for the account before executing the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    /// Fake nonce to set for the account before executing the call.
    #[serde(skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub nonce: Option<u64>,
    /// Fake EVM bytecode to inject into the account before executing the
    /// call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Fake key-value mapping to override ALL slots in the account storage
    /// before executing the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<B256HashMap<B256>>,
    /// Fake key-value mapping to override INDIVIDUAL slots in the account
    /// storage before executing the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_diff: Option<B256HashMap<B256>>,
}

impl AccountOverride {
    /// Configures the balance override.
    pub const fn with_balance(mut self, balance: U256) -> Self {
        self.balance = Some(balance);
        self
    }

    /// Configures the nonce override.
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Configures the bytecode override.
    pub fn with_code(mut self, code: impl Into<Bytes>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Configures the whole-storage override.
    pub fn with_state(mut self, state: impl IntoIterator<Item = (B256, B256)>) -> Self {
        self.state = Some(state.into_iter().collect());
        self
    }

    /// Configures the storage-diff override.
    pub fn with_state_diff(mut self, state_diff: impl IntoIterator<Item = (B256, B256)>) -> Self {
        self.state_diff = Some(state_diff.into_iter().collect());
        self
    }

    /// Check the override's wire invariants.
    pub const fn validate(&self) -> Result<(), OverrideError> {
        if self.state.is_some() && self.state_diff.is_some() {
            return Err(OverrideError::ConflictingStorageOverride);
        }
        Ok(())
    }
}

/// A builder type for [`StateOverride`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateOverridesBuilder {
    overrides: StateOverride,
}

impl StateOverridesBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account override for a specific address.
    pub fn append(mut self, address: Address, account_override: AccountOverride) -> Self {
        self.overrides.insert(address, account_override);
        self
    }

    /// Configures an account override with a balance.
    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.overrides.entry(address).or_default().balance = Some(balance);
        self
    }

    /// Configures an account override with a nonce.
    pub fn with_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.overrides.entry(address).or_default().nonce = Some(nonce);
        self
    }

    /// Configures an account override with bytecode.
    pub fn with_code(mut self, address: Address, code: impl Into<Bytes>) -> Self {
        self.overrides.entry(address).or_default().code = Some(code.into());
        self
    }

    /// Get the underlying [`StateOverride`], checking every account's
    /// invariants.
    pub fn build(self) -> Result<StateOverride, OverrideError> {
        for account in self.overrides.values() {
            account.validate()?;
        }
        Ok(self.overrides)
    }
}

impl FromIterator<(Address, AccountOverride)> for StateOverridesBuilder {
    fn from_iter<T: IntoIterator<Item = (Address, AccountOverride)>>(iter: T) -> Self {
        Self { overrides: StateOverride::from_iter(iter) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn state_and_state_diff_are_exclusive() {
        let bad = AccountOverride::default()
            .with_state([(B256::ZERO, B256::ZERO)])
            .with_state_diff([(B256::ZERO, B256::ZERO)]);
        assert_eq!(bad.validate(), Err(OverrideError::ConflictingStorageOverride));

        let builder = StateOverridesBuilder::new()
            .append(address!("3333333333333333333333333333333333333333"), bad);
        assert!(builder.build().is_err());
    }

    #[test]
    fn large_values_round_trip() {
        let json = r#"{
            "balance": "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            "nonce": "0xffffffffffffffff"
        }"#;
        let account: AccountOverride = serde_json::from_str(json).unwrap();
        assert_eq!(account.balance, Some(U256::MAX));
        assert_eq!(account.nonce, Some(u64::MAX));
    }

    #[test]
    fn override_wire_shape() {
        let account = AccountOverride::default()
            .with_balance(U256::from(100u64))
            .with_nonce(42)
            .with_code(vec![0x60, 0x00]);
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "balance": "0x64",
                "nonce": "0x2a",
                "code": "0x6000"
            })
        );
    }
}
