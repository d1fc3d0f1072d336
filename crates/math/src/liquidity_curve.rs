/// Liquidity curve construction around the active bin
///
/// Each bin `b` in `[active - radius, active + radius]` is weighted by
/// `exp(-decay * |b - active|)`. Weights are quantised to integers before the
/// split so the result is deterministic and `floor(total * w / sum_w)` can be
/// computed exactly. The flooring remainder is deposited in the active bin.

use launchpad_types::{
    BinDistribution, BinLiquidity, CurveParams, LaunchpadError, LaunchpadResult,
    CURVE_WEIGHT_SCALE, MAX_BIN_ID, MAX_BIN_RADIUS, MIN_BIN_ID,
};

use crate::safe::{mul_div_floor, safe_add_u64};

/// Build the distribution with the default decay
pub fn build_curve(active_bin: i32, radius: u32, total_amount: u64) -> LaunchpadResult<BinDistribution> {
    build_curve_with(
        active_bin,
        &CurveParams {
            radius,
            ..CurveParams::default()
        },
        total_amount,
    )
}

/// Build the distribution for explicit curve parameters
pub fn build_curve_with(
    active_bin: i32,
    params: &CurveParams,
    total_amount: u64,
) -> LaunchpadResult<BinDistribution> {
    validate(active_bin, params, total_amount)?;

    let radius = params.radius as i32;
    let weights = distance_weights(params);
    let total_weight: u128 = (-radius..=radius)
        .map(|offset| weights[offset.unsigned_abs() as usize])
        .sum();

    let mut bins = Vec::with_capacity(2 * params.radius as usize + 1);
    let mut allocated = 0u64;
    for offset in -radius..=radius {
        let weight = weights[offset.unsigned_abs() as usize];
        let amount = mul_div_floor(total_amount, weight, total_weight)?;
        allocated = safe_add_u64(allocated, amount)?;
        bins.push((active_bin + offset, amount));
    }

    // Flooring loses less than one unit per bin; the active bin absorbs it
    let remainder = total_amount - allocated;
    let active_index = params.radius as usize;
    bins[active_index].1 += remainder;

    let bins = bins
        .into_iter()
        .map(|(bin_id, amount)| split_sides(bin_id, active_bin, amount))
        .collect();

    Ok(BinDistribution { active_bin, bins })
}

fn validate(active_bin: i32, params: &CurveParams, total_amount: u64) -> LaunchpadResult<()> {
    if params.radius == 0 {
        return Err(LaunchpadError::invalid_curve("radius must be greater than 0"));
    }

    if params.radius > MAX_BIN_RADIUS {
        return Err(LaunchpadError::invalid_curve(format!(
            "radius {} exceeds maximum {}",
            params.radius, MAX_BIN_RADIUS
        )));
    }

    if total_amount == 0 {
        return Err(LaunchpadError::invalid_curve("total amount must be greater than 0"));
    }

    if !params.decay.is_finite() || params.decay < 0.0 {
        return Err(LaunchpadError::invalid_curve(format!(
            "decay must be finite and non-negative, got {}",
            params.decay
        )));
    }

    let lower = active_bin as i64 - params.radius as i64;
    let upper = active_bin as i64 + params.radius as i64;
    if lower < MIN_BIN_ID as i64 || upper > MAX_BIN_ID as i64 {
        return Err(LaunchpadError::invalid_curve(format!(
            "bin range [{}, {}] outside [{}, {}]",
            lower, upper, MIN_BIN_ID, MAX_BIN_ID
        )));
    }

    Ok(())
}

/// Quantised weight per distance from the active bin, index 0 is the active bin
fn distance_weights(params: &CurveParams) -> Vec<u128> {
    (0..=params.radius)
        .map(|distance| {
            let weight = (-params.decay * distance as f64).exp();
            (weight * CURVE_WEIGHT_SCALE).round() as u128
        })
        .collect()
}

/// Below the active bin holds base liquidity, above holds quote, the active bin both
fn split_sides(bin_id: i32, active_bin: i32, amount: u64) -> BinLiquidity {
    let (base_amount, quote_amount) = if bin_id < active_bin {
        (amount, 0)
    } else if bin_id > active_bin {
        (0, amount)
    } else {
        let quote = amount / 2;
        (amount - quote, quote)
    };

    BinLiquidity {
        bin_id,
        base_amount,
        quote_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_covers_range_in_order() {
        let dist = build_curve(-926, 10, 200_000_000_000_000_000).unwrap();

        assert_eq!(dist.len(), 21);
        assert_eq!(dist.lower_bin(), Some(-936));
        assert_eq!(dist.upper_bin(), Some(-916));
        assert!(dist.bins.windows(2).all(|w| w[1].bin_id == w[0].bin_id + 1));
    }

    #[test]
    fn test_conserves_total() {
        let total = 200_000_000_000_000_000;
        let dist = build_curve(0, 10, total).unwrap();
        assert_eq!(dist.total_amount(), total);
    }

    #[test]
    fn test_remainder_lands_in_active_bin() {
        // 7 units over 3 equal bins: 2 + 2 + 2 = 6, remainder 1 to the active bin
        let params = CurveParams { radius: 1, decay: 0.0 };
        let dist = build_curve_with(5, &params, 7).unwrap();

        assert_eq!(dist.bins[0].total(), 2);
        assert_eq!(dist.active().unwrap().total(), 3);
        assert_eq!(dist.bins[2].total(), 2);
        assert_eq!(dist.total_amount(), 7);
    }

    #[test]
    fn test_sides_and_shape() {
        let dist = build_curve(100, 10, 1_000_000_000).unwrap();

        for bin in &dist.bins {
            if bin.bin_id < 100 {
                assert_eq!(bin.quote_amount, 0);
                assert!(bin.base_amount > 0);
            } else if bin.bin_id > 100 {
                assert_eq!(bin.base_amount, 0);
                assert!(bin.quote_amount > 0);
            }
        }

        let active = dist.active().unwrap();
        assert!(active.base_amount > 0 && active.quote_amount > 0);

        // Peaks at the active bin and decays outward symmetrically
        let totals: Vec<u64> = dist.bins.iter().map(|b| b.total()).collect();
        assert!(totals[..10].windows(2).all(|w| w[0] <= w[1]));
        assert!(totals[10..].windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(totals[0], totals[20]);
    }

    #[test]
    fn test_deterministic() {
        let a = build_curve(-926, 10, 123_456_789_012_345).unwrap();
        let b = build_curve(-926, 10, 123_456_789_012_345).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_curve_input() {
        assert!(matches!(build_curve(0, 0, 100), Err(LaunchpadError::InvalidCurveInput { .. })));
        assert!(matches!(build_curve(0, 10, 0), Err(LaunchpadError::InvalidCurveInput { .. })));
        assert!(matches!(
            build_curve(0, MAX_BIN_RADIUS + 1, 100),
            Err(LaunchpadError::InvalidCurveInput { .. })
        ));
        assert!(matches!(
            build_curve(MAX_BIN_ID, 1, 100),
            Err(LaunchpadError::InvalidCurveInput { .. })
        ));
        let params = CurveParams { radius: 3, decay: f64::NAN };
        assert!(matches!(
            build_curve_with(0, &params, 100),
            Err(LaunchpadError::InvalidCurveInput { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_curve_conserves_total(
            active in -400_000i32..400_000,
            radius in 1u32..=64,
            total in 1u64..=u64::MAX,
            decay in 0.0f64..2.0,
        ) {
            let params = CurveParams { radius, decay };
            let dist = build_curve_with(active, &params, total).unwrap();

            let sum: u128 = dist.bins.iter().map(|b| b.base_amount as u128 + b.quote_amount as u128).sum();
            prop_assert_eq!(sum, total as u128);
            prop_assert_eq!(dist.len(), 2 * radius as usize + 1);

            for bin in dist.bins.iter().filter(|b| b.bin_id != active) {
                prop_assert!(bin.base_amount == 0 || bin.quote_amount == 0);
            }
        }

        #[test]
        fn prop_curve_is_pure(
            active in -1_000i32..1_000,
            radius in 1u32..=32,
            total in 1u64..=1_000_000_000_000_000_000,
        ) {
            prop_assert_eq!(
                build_curve(active, radius, total).unwrap(),
                build_curve(active, radius, total).unwrap()
            );
        }
    }
}
