//! [EIP-1559] fee helpers.
//!
//! [EIP-1559]: https://eips.ethereum.org/EIPS/eip-1559

use serde::{Deserialize, Serialize};

/// The default priority fee offered to block producers: 1 gwei.
pub const DEFAULT_PRIORITY_FEE_PER_GAS: u128 = 1_000_000_000;

/// Multiplier applied to the base fee when deriving a fee cap, so the
/// transaction stays includable across several base-fee increases.
pub const BASE_FEE_HEADROOM: u128 = 2;

/// An estimated pair of EIP-1559 fee fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip1559Estimation {
    /// The fee cap per gas.
    pub max_fee_per_gas: u128,
    /// The priority fee per gas.
    pub max_priority_fee_per_gas: u128,
}

/// Estimate EIP-1559 fee fields from the latest block's base fee and a
/// priority tip: `max_fee = 2 * base_fee + tip`.
pub const fn estimate_eip1559_fees(base_fee: u128, priority_fee: u128) -> Eip1559Estimation {
    Eip1559Estimation {
        max_fee_per_gas: base_fee.saturating_mul(BASE_FEE_HEADROOM).saturating_add(priority_fee),
        max_priority_fee_per_gas: priority_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_base_fee_and_adds_tip() {
        let est = estimate_eip1559_fees(100, 7);
        assert_eq!(est.max_fee_per_gas, 207);
        assert_eq!(est.max_priority_fee_per_gas, 7);
    }

    #[test]
    fn zero_base_fee() {
        let est = estimate_eip1559_fees(0, DEFAULT_PRIORITY_FEE_PER_GAS);
        assert_eq!(est.max_fee_per_gas, DEFAULT_PRIORITY_FEE_PER_GAS);
    }
}
