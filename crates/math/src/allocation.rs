/// Supply allocation between the creator and the liquidity pool
///
/// Integer arithmetic only. The creator side is floored and the remainder is
/// assigned to liquidity, so no base unit is ever lost to rounding.

use launchpad_types::{
    LaunchpadError, LaunchpadResult, TokenAllocation, BPS_DENOMINATOR, MAX_BPS, MAX_DECIMALS,
};

use crate::safe::{mul_div_floor, safe_pow10_u64};

/// Split `total_supply` whole tokens at `decimals` between creator and liquidity.
///
/// `creator_share_bps` is the creator's share in basis points, `(0, 10000]`.
/// A share of exactly 10000 yields a zero liquidity side; callers that need a
/// pool must reject that share before calling.
pub fn allocate(
    total_supply: u64,
    decimals: u8,
    creator_share_bps: u16,
) -> LaunchpadResult<TokenAllocation> {
    if total_supply == 0 {
        return Err(LaunchpadError::invalid_allocation("total supply must be greater than 0"));
    }

    if decimals > MAX_DECIMALS {
        return Err(LaunchpadError::invalid_allocation(format!(
            "decimals {} exceeds maximum {}",
            decimals, MAX_DECIMALS
        )));
    }

    if creator_share_bps == 0 || creator_share_bps > MAX_BPS {
        return Err(LaunchpadError::invalid_allocation(format!(
            "creator share {} bps not in (0, {}]",
            creator_share_bps, MAX_BPS
        )));
    }

    let scale = safe_pow10_u64(decimals as u32)
        .map_err(|_| LaunchpadError::invalid_allocation("decimal scale overflows 64 bits"))?;

    let total_supply_base_units = total_supply.checked_mul(scale).ok_or_else(|| {
        LaunchpadError::invalid_allocation(format!(
            "supply {} x 10^{} overflows 64 bits",
            total_supply, decimals
        ))
    })?;

    let creator_amount = mul_div_floor(
        total_supply_base_units,
        creator_share_bps as u128,
        BPS_DENOMINATOR as u128,
    )?;
    let liquidity_amount = total_supply_base_units - creator_amount;

    Ok(TokenAllocation {
        supply: total_supply,
        decimals,
        creator_share_bps,
        total_supply_base_units,
        creator_amount,
        liquidity_amount,
    })
}
