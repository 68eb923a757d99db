//! Resolution of absent transaction fields before signing.

use crate::{ChainProfile, Provider, TxError};
use ferrite_eips::eip1559::estimate_eip1559_fees;
use ferrite_rpc_types::{BlockId, BlockNumberOrTag, TransactionRequest};
use ferrite_transport::Transport;
use tracing::trace;

/// Resolve every absent field of `req` by querying the node, in the fixed
/// evaluation order: nonce, fees, gas limit. Explicitly set fields are never
/// overwritten. The caller has already performed the chain-id check and set
/// `from`.
///
/// The blob pipeline sequences the same steps itself, so that the blob fee
/// lands between the fee and gas-limit steps.
pub(crate) async fn fill_transaction<T, P>(
    provider: &P,
    profile: &ChainProfile,
    req: &mut TransactionRequest,
) -> Result<(), TxError>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    fill_nonce(provider, req).await?;
    fill_fees(provider, profile, req).await?;
    fill_gas_limit(provider, profile, req).await?;
    Ok(())
}

/// Fill the nonce from the account's pending transaction count.
pub(crate) async fn fill_nonce<T, P>(provider: &P, req: &mut TransactionRequest) -> Result<(), TxError>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    if req.nonce.is_some() {
        return Ok(());
    }
    let from = req.from.ok_or(ferrite_signer::SignerError::MissingField("from"))?;
    let nonce =
        provider.get_transaction_count(from, BlockId::Number(BlockNumberOrTag::Pending)).await?;
    trace!(nonce, "filled nonce from pending count");
    req.nonce = Some(nonce);
    Ok(())
}

/// Fill the fee fields.
///
/// - An explicit `gas_price` selects the legacy path; nothing to do.
/// - Both EIP-1559 fields set: nothing to do.
/// - A latest block with a base fee yields EIP-1559 fees: the profile's
///   default priority fee when absent, and `2 * base_fee + tip` as the cap.
/// - Otherwise (pre-London, or the profile opts out) the legacy gas price is
///   fetched from the node.
pub(crate) async fn fill_fees<T, P>(
    provider: &P,
    profile: &ChainProfile,
    req: &mut TransactionRequest,
) -> Result<(), TxError>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    if req.gas_price.is_some() || req.has_eip1559_fees() {
        return Ok(());
    }

    let base_fee = if profile.supports_eip1559 {
        provider
            .get_latest_block()
            .await?
            .and_then(|block| block.header.base_fee_per_gas)
            .map(|fee| fee.saturating_to::<u128>())
    } else {
        None
    };

    match base_fee {
        Some(base_fee) => {
            let tip = req.max_priority_fee_per_gas.unwrap_or(profile.default_priority_fee);
            let estimate = estimate_eip1559_fees(base_fee, tip);
            trace!(?estimate, base_fee, "filled eip1559 fees");
            if req.max_priority_fee_per_gas.is_none() {
                req.max_priority_fee_per_gas = Some(estimate.max_priority_fee_per_gas);
            }
            if req.max_fee_per_gas.is_none() {
                req.max_fee_per_gas = Some(estimate.max_fee_per_gas);
            }
        }
        None => {
            let gas_price = provider.get_gas_price().await?;
            trace!(gas_price, "filled legacy gas price");
            req.gas_price = Some(gas_price);
        }
    }
    Ok(())
}

/// Fill the gas limit from an estimate, scaled by the profile's buffer.
///
/// The request is passed to the estimator as-is, access list included, so
/// the estimate reflects the declared accesses.
pub(crate) async fn fill_gas_limit<T, P>(
    provider: &P,
    profile: &ChainProfile,
    req: &mut TransactionRequest,
) -> Result<(), TxError>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    if req.gas_limit.is_some() {
        return Ok(());
    }
    let estimate = provider.estimate_gas(req, BlockId::default()).await?;
    let buffered = profile.buffered_gas_limit(estimate);
    trace!(estimate, buffered, "filled gas limit");
    req.gas_limit = Some(buffered);
    Ok(())
}
