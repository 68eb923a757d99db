use ferrite_eips::eip1559::DEFAULT_PRIORITY_FEE_PER_GAS;

/// Static knowledge about the chain a wallet sends to.
///
/// The configured `chain_id` is authoritative: the pipeline compares it
/// against the node's `eth_chainId` before every submission and refuses to
/// sign on a mismatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainProfile {
    /// The expected chain id.
    pub chain_id: u64,
    /// Whether the chain prices gas via EIP-1559. Legacy gas pricing is used
    /// when `false`.
    pub supports_eip1559: bool,
    /// The priority fee offered when the caller specifies none.
    pub default_priority_fee: u128,
    /// Floor for the blob fee cap of EIP-4844 transactions.
    pub min_blob_fee: u128,
    /// Numerator of the buffer applied to gas estimates.
    pub gas_buffer_numerator: u64,
    /// Denominator of the buffer applied to gas estimates.
    pub gas_buffer_denominator: u64,
}

impl ChainProfile {
    /// A profile for the given chain id with the default knobs: EIP-1559
    /// enabled, 1 gwei priority fee, 1 wei blob-fee floor, and a 120/100
    /// gas buffer.
    pub const fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            supports_eip1559: true,
            default_priority_fee: DEFAULT_PRIORITY_FEE_PER_GAS,
            min_blob_fee: 1,
            gas_buffer_numerator: 120,
            gas_buffer_denominator: 100,
        }
    }

    /// Set whether the chain supports EIP-1559.
    pub const fn with_eip1559(mut self, supports: bool) -> Self {
        self.supports_eip1559 = supports;
        self
    }

    /// Set the default priority fee.
    pub const fn with_default_priority_fee(mut self, fee: u128) -> Self {
        self.default_priority_fee = fee;
        self
    }

    /// Set the blob-fee floor.
    pub const fn with_min_blob_fee(mut self, fee: u128) -> Self {
        self.min_blob_fee = fee;
        self
    }

    /// Set the gas buffer as a ratio. Estimates are multiplied by
    /// `numerator / denominator`, rounding down.
    pub const fn with_gas_buffer(mut self, numerator: u64, denominator: u64) -> Self {
        assert!(denominator != 0, "gas buffer denominator must be non-zero");
        self.gas_buffer_numerator = numerator;
        self.gas_buffer_denominator = denominator;
        self
    }

    /// Apply the gas buffer to an estimate, rounding down.
    pub const fn buffered_gas_limit(&self, estimate: u64) -> u64 {
        let scaled =
            (estimate as u128 * self.gas_buffer_numerator as u128) / self.gas_buffer_denominator as u128;
        if scaled > u64::MAX as u128 {
            u64::MAX
        } else {
            scaled as u64
        }
    }
}

impl Default for ChainProfile {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_rounds_down() {
        let profile = ChainProfile::new(1);
        assert_eq!(profile.buffered_gas_limit(21_000), 25_200);
        assert_eq!(profile.buffered_gas_limit(1), 1);
        let thirds = ChainProfile::new(1).with_gas_buffer(100, 3);
        assert_eq!(thirds.buffered_gas_limit(1), 33);
    }
}
