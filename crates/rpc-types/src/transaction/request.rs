use crate::AccessList;
use alloy_primitives::{Address, Bytes, B256, U256};
use ferrite_eips::eip4844::BlobTransactionSidecar;
use serde::{Deserialize, Serialize};

/// Errors raised when a transaction request violates a build invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TxValidationError {
    /// Legacy and EIP-1559 fee fields are mutually exclusive.
    #[error("`gasPrice` cannot be set together with `maxFeePerGas` or `maxPriorityFeePerGas`")]
    ConflictingFeeFields,
    /// A contract creation carries its init code in the data field.
    #[error("contract creation (no `to`) requires calldata")]
    CreateWithoutData,
    /// Blob transactions cannot create contracts.
    #[error("blob transactions require a recipient")]
    BlobWithoutRecipient,
    /// The operation does not support contract creation.
    #[error("a recipient (`to`) is required")]
    MissingRecipient,
    /// A simulation needs something to execute.
    #[error("at least one call is required")]
    EmptyCalls,
    /// A blob transaction must carry at least one blob.
    #[error("blob transactions require a non-empty sidecar")]
    EmptySidecar,
}

/// A request to build a transaction, as accepted by `eth_call`,
/// `eth_estimateGas`, and the sending pipeline.
///
/// All fields are optional at construction. The pipeline resolves every
/// absent field before signing; explicitly set fields are never overwritten.
///
/// `gasPrice` and the EIP-1559 fee fields are mutually exclusive; the
/// invariant is enforced by [`validate`](Self::validate), which the pipeline
/// and the simulation encoder call before anything reaches the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// The sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// The recipient. `None` requests a contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// The transferred value, in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// The gas limit.
    #[serde(
        default,
        rename = "gas",
        skip_serializing_if = "Option::is_none",
        with = "ferrite_serde::quantity::opt"
    )]
    pub gas_limit: Option<u64>,
    /// The legacy gas price.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub gas_price: Option<u128>,
    /// The EIP-1559 fee cap per gas.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub max_fee_per_gas: Option<u128>,
    /// The EIP-1559 priority fee per gas.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub max_priority_fee_per_gas: Option<u128>,
    /// The sender's nonce.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub nonce: Option<u64>,
    /// The calldata.
    #[serde(default, rename = "data", alias = "input", skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
    /// The access list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    /// The chain the transaction is for.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub chain_id: Option<u64>,
}

impl TransactionRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender.
    pub const fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the recipient.
    pub const fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the value.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the gas limit.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Set the legacy gas price.
    pub const fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set the EIP-1559 fee cap.
    pub const fn with_max_fee_per_gas(mut self, max_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    /// Set the EIP-1559 priority fee.
    pub const fn with_max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: u128) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    /// Set the nonce.
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the calldata.
    pub fn with_input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set the access list.
    pub fn with_access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = Some(access_list);
        self
    }

    /// Set the chain id.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Returns `true` if both EIP-1559 fee fields are set.
    pub const fn has_eip1559_fees(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }

    /// Check the request's build invariants.
    pub const fn validate(&self) -> Result<(), TxValidationError> {
        if self.gas_price.is_some()
            && (self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some())
        {
            return Err(TxValidationError::ConflictingFeeFields);
        }
        if self.to.is_none() && self.input.is_none() {
            return Err(TxValidationError::CreateWithoutData);
        }
        Ok(())
    }

    /// Validate the request, returning it on success.
    pub fn build(self) -> Result<Self, TxValidationError> {
        self.validate()?;
        Ok(self)
    }
}

/// A request to build an EIP-4844 blob transaction.
///
/// The sidecar travels to the signer, not over JSON-RPC; only the versioned
/// hashes derived from it appear in the serialized request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobTransactionRequest {
    /// The base transaction fields.
    #[serde(flatten)]
    pub tx: TransactionRequest,
    /// The fee cap per blob gas.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ferrite_serde::quantity::opt")]
    pub max_fee_per_blob_gas: Option<u128>,
    /// The versioned hashes of the carried blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
    /// The blobs with their commitments and proofs.
    #[serde(skip)]
    pub sidecar: BlobTransactionSidecar,
}

impl BlobTransactionRequest {
    /// Create a blob transaction request from base fields and a sidecar.
    pub fn new(tx: TransactionRequest, sidecar: BlobTransactionSidecar) -> Self {
        Self { tx, max_fee_per_blob_gas: None, blob_versioned_hashes: None, sidecar }
    }

    /// Set the blob fee cap.
    pub const fn with_max_fee_per_blob_gas(mut self, max_fee_per_blob_gas: u128) -> Self {
        self.max_fee_per_blob_gas = Some(max_fee_per_blob_gas);
        self
    }

    /// Check the request's build invariants, including the blob-specific
    /// ones: a recipient is required (blob transactions cannot create
    /// contracts) and the sidecar must carry at least one blob.
    pub fn validate(&self) -> Result<(), TxValidationError> {
        if self.tx.gas_price.is_some()
            && (self.tx.max_fee_per_gas.is_some() || self.tx.max_priority_fee_per_gas.is_some())
        {
            return Err(TxValidationError::ConflictingFeeFields);
        }
        if self.tx.to.is_none() {
            return Err(TxValidationError::BlobWithoutRecipient);
        }
        if self.sidecar.is_empty() {
            return Err(TxValidationError::EmptySidecar);
        }
        Ok(())
    }

    /// Validate the request, returning it with the versioned hashes filled
    /// from the sidecar.
    pub fn build(mut self) -> Result<Self, TxValidationError> {
        self.validate()?;
        if self.blob_versioned_hashes.is_none() {
            self.blob_versioned_hashes = Some(self.sidecar.versioned_hashes());
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn rejects_conflicting_fee_fields() {
        let req = TransactionRequest::new()
            .with_to(address!("2222222222222222222222222222222222222222"))
            .with_gas_price(1_000_000_000)
            .with_max_fee_per_gas(2_000_000_000);
        assert_eq!(req.validate(), Err(TxValidationError::ConflictingFeeFields));

        let req = TransactionRequest::new()
            .with_to(address!("2222222222222222222222222222222222222222"))
            .with_gas_price(1_000_000_000)
            .with_max_priority_fee_per_gas(1);
        assert_eq!(req.validate(), Err(TxValidationError::ConflictingFeeFields));
    }

    #[test]
    fn accepts_either_fee_scheme_alone() {
        let to = address!("2222222222222222222222222222222222222222");
        assert!(TransactionRequest::new().with_to(to).with_gas_price(1).validate().is_ok());
        assert!(TransactionRequest::new()
            .with_to(to)
            .with_max_fee_per_gas(2)
            .with_max_priority_fee_per_gas(1)
            .validate()
            .is_ok());
    }

    #[test]
    fn creation_requires_data() {
        assert_eq!(
            TransactionRequest::new().validate(),
            Err(TxValidationError::CreateWithoutData)
        );
        assert!(TransactionRequest::new().with_input(vec![0x60, 0x01]).validate().is_ok());
    }

    #[test]
    fn gas_limit_serializes_as_gas() {
        let req = TransactionRequest::new()
            .with_to(address!("2222222222222222222222222222222222222222"))
            .with_gas_limit(21_000)
            .with_value(U256::ZERO);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["value"], "0x0");
        assert!(json.get("gasLimit").is_none());
    }

    #[test]
    fn blob_request_invariants() {
        let to = address!("2222222222222222222222222222222222222222");
        let empty = BlobTransactionRequest::new(
            TransactionRequest::new().with_to(to),
            BlobTransactionSidecar::default(),
        );
        assert_eq!(empty.validate(), Err(TxValidationError::EmptySidecar));

        let no_recipient =
            BlobTransactionRequest::new(TransactionRequest::new(), BlobTransactionSidecar::default());
        assert_eq!(no_recipient.validate(), Err(TxValidationError::BlobWithoutRecipient));
    }
}
