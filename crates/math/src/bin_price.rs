/// Price to bin-id conversion for bin-based liquidity pools
///
/// Bins form a geometric ladder: bin `i` trades at `(1 + step / 10000)^i`.
/// The mapping discretises prices, so `bin_to_price(price_to_bin(p))` only
/// recovers `p` to within one bin width. Ties round to the nearest bin away
/// from zero (`f64::round`).

use launchpad_types::{LaunchpadError, LaunchpadResult, BPS_DENOMINATOR, MAX_BIN_ID, MIN_BIN_ID};

/// Natural log of the per-bin price ratio
fn ln_bin_base(bin_step_bps: u16) -> LaunchpadResult<f64> {
    if bin_step_bps == 0 {
        return Err(LaunchpadError::invalid_price("bin step must be greater than 0"));
    }
    Ok((bin_step_bps as f64 / BPS_DENOMINATOR as f64).ln_1p())
}

/// Price ratio between adjacent bins
pub fn bin_width(bin_step_bps: u16) -> LaunchpadResult<f64> {
    Ok(ln_bin_base(bin_step_bps)?.exp())
}

/// Map a quote-per-base price to the nearest bin id
pub fn price_to_bin(price: f64, bin_step_bps: u16) -> LaunchpadResult<i32> {
    if !price.is_finite() || price <= 0.0 {
        return Err(LaunchpadError::invalid_price(format!(
            "price must be positive and finite, got {}",
            price
        )));
    }

    let ln_base = ln_bin_base(bin_step_bps)?;
    let bin = (price.ln() / ln_base).round();

    if !bin.is_finite() || bin < MIN_BIN_ID as f64 || bin > MAX_BIN_ID as f64 {
        return Err(LaunchpadError::invalid_price(format!(
            "price {} maps outside bin range [{}, {}] at step {} bps",
            price, MIN_BIN_ID, MAX_BIN_ID, bin_step_bps
        )));
    }

    Ok(bin as i32)
}

/// Price at the centre of `bin_id`
pub fn bin_to_price(bin_id: i32, bin_step_bps: u16) -> LaunchpadResult<f64> {
    if !(MIN_BIN_ID..=MAX_BIN_ID).contains(&bin_id) {
        return Err(LaunchpadError::invalid_price(format!(
            "bin {} not in [{}, {}]",
            bin_id, MIN_BIN_ID, MAX_BIN_ID
        )));
    }

    let price = (bin_id as f64 * ln_bin_base(bin_step_bps)?).exp();
    if !price.is_finite() || price <= 0.0 {
        return Err(LaunchpadError::invalid_price(format!(
            "bin {} at step {} bps has no representable price",
            bin_id, bin_step_bps
        )));
    }

    Ok(price)
}

/// Convert a human price (whole quote per whole base token) into a price per
/// base unit expressed in quote base units.
pub fn price_per_base_unit(price: f64, base_decimals: u8, quote_decimals: u8) -> f64 {
    price * 10f64.powi(quote_decimals as i32 - base_decimals as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_unit_price_is_bin_zero() {
        assert_eq!(price_to_bin(1.0, 100).unwrap(), 0);
        assert_relative_eq!(bin_to_price(0, 100).unwrap(), 1.0);
    }

    #[test]
    fn test_default_launch_price() {
        let bin = price_to_bin(0.0001, 100).unwrap();
        assert_eq!(bin, -926);
        assert_eq!(price_to_bin(0.0001, 100).unwrap(), bin);

        let recovered = bin_to_price(bin, 100).unwrap();
        assert!((recovered - 0.0001).abs() / 0.0001 < 0.01);
    }

    #[test]
    fn test_bins_follow_step() {
        assert_eq!(price_to_bin(1.01, 100).unwrap(), 1);
        assert_eq!(price_to_bin(1.0 / 1.01, 100).unwrap(), -1);
        assert_relative_eq!(bin_to_price(2, 50).unwrap(), 1.005f64.powi(2), max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_price_input() {
        assert!(matches!(price_to_bin(0.0, 100), Err(LaunchpadError::InvalidPriceInput { .. })));
        assert!(matches!(price_to_bin(-1.0, 100), Err(LaunchpadError::InvalidPriceInput { .. })));
        assert!(matches!(price_to_bin(f64::NAN, 100), Err(LaunchpadError::InvalidPriceInput { .. })));
        assert!(matches!(price_to_bin(1.0, 0), Err(LaunchpadError::InvalidPriceInput { .. })));
        assert!(matches!(bin_to_price(MAX_BIN_ID + 1, 1), Err(LaunchpadError::InvalidPriceInput { .. })));
    }

    #[test]
    fn test_decimal_adjustment() {
        assert_relative_eq!(price_per_base_unit(0.5, 9, 9), 0.5);
        assert_relative_eq!(price_per_base_unit(0.5, 6, 9), 500.0);
        assert_relative_eq!(price_per_base_unit(0.5, 9, 6), 0.0005);
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_one_bin(
            exponent in -8.0f64..4.0,
            step in 1u16..=500,
        ) {
            let price = 10f64.powf(exponent);
            let bin = price_to_bin(price, step).unwrap();
            let recovered = bin_to_price(bin, step).unwrap();
            let width = bin_width(step).unwrap();

            let ratio = recovered / price;
            prop_assert!(ratio <= width * (1.0 + 1e-9));
            prop_assert!(ratio >= (1.0 / width) * (1.0 - 1e-9));
        }
    }
}
