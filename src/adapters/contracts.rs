//! Contract addresses and call encoding for redemption on Polygon.

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use rust_decimal::Decimal;

use crate::error::ClaimError;

/// Conditional Tokens Framework
pub const CONDITIONAL_TOKENS: Address = address!("4D97DCd97eC945f40cF65F87097ACe5EA0476045");
/// USDC.e, the only collateral we redeem into
pub const USDC_E: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
/// Adapter that wraps CTF for negative-risk (multi-outcome) markets
pub const NEG_RISK_ADAPTER: Address = address!("d91E80cF2E7be2e162c6513ceD06f1dD0dA35296");

/// USDC has 6 decimals
pub const USDC_DECIMALS: u32 = 6;

sol! {
    #[allow(missing_docs)]
    interface IConditionalTokens {
        /// Redeem positions for a resolved condition
        function redeemPositions(
            address collateralToken,
            bytes32 parentCollectionId,
            bytes32 conditionId,
            uint256[] calldata indexSets
        ) external;
    }

    #[allow(missing_docs)]
    interface INegRiskAdapter {
        function redeemPositions(bytes32 conditionId, uint256[] calldata amounts) external;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Calldata for `ConditionalTokens.redeemPositions` with USDC.e collateral and
/// the zero parent collection.
pub fn redeem_positions_calldata(condition_id: B256, index_sets: Vec<U256>) -> Bytes {
    IConditionalTokens::redeemPositionsCall {
        collateralToken: USDC_E,
        parentCollectionId: B256::ZERO,
        conditionId: condition_id,
        indexSets: index_sets,
    }
    .abi_encode()
    .into()
}

/// Calldata for `NegRiskAdapter.redeemPositions`.
pub fn neg_risk_redeem_calldata(condition_id: B256, amounts: Vec<U256>) -> Bytes {
    INegRiskAdapter::redeemPositionsCall {
        conditionId: condition_id,
        amounts,
    }
    .abi_encode()
    .into()
}

/// Share quantity in 6-decimal base units, truncated. Negative amounts clamp to zero.
pub fn to_base_units(amount: Decimal) -> crate::error::Result<U256> {
    if amount <= Decimal::ZERO {
        return Ok(U256::ZERO);
    }
    let scaled = amount
        .checked_mul(Decimal::from(10u64.pow(USDC_DECIMALS)))
        .ok_or_else(|| ClaimError::Settlement(format!("amount {} is out of range", amount)))?
        .trunc();
    Ok(U256::from(scaled.mantissa().unsigned_abs() / 10u128.pow(scaled.scale())))
}

/// Base units back to a decimal amount.
pub fn from_base_units(raw: U256) -> Decimal {
    let raw: u128 = raw.try_into().unwrap_or(u128::MAX);
    i128::try_from(raw)
        .ok()
        .and_then(|r| Decimal::try_from_i128_with_scale(r, USDC_DECIMALS).ok())
        .unwrap_or(Decimal::MAX)
}
