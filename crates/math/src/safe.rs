/// Checked integer helpers used by the calculators
///
/// All operations return errors instead of panicking.

use launchpad_types::{LaunchpadError, LaunchpadResult};

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

/// Safe multiplication for u128 values
pub fn safe_mul_u128(a: u128, b: u128) -> LaunchpadResult<u128> {
    a.checked_mul(b)
        .ok_or_else(|| LaunchpadError::math_overflow("u128 multiplication", &[&a.to_string(), &b.to_string()]))
}

/// Safe addition for u64 values
pub fn safe_add_u64(a: u64, b: u64) -> LaunchpadResult<u64> {
    a.checked_add(b)
        .ok_or_else(|| LaunchpadError::math_overflow("u64 addition", &[&a.to_string(), &b.to_string()]))
}

/// Safe integer exponentiation of ten
pub fn safe_pow10_u64(exp: u32) -> LaunchpadResult<u64> {
    10u64
        .checked_pow(exp)
        .ok_or_else(|| LaunchpadError::math_overflow("exponentiation", &["10", &exp.to_string()]))
}

/// `floor(value * numerator / denominator)` computed in u128
pub fn mul_div_floor(value: u64, numerator: u128, denominator: u128) -> LaunchpadResult<u64> {
    if denominator == 0 {
        return Err(LaunchpadError::math_overflow(
            "mul_div_floor division by zero",
            &[&value.to_string(), &numerator.to_string()],
        ));
    }

    let product = safe_mul_u128(value as u128, numerator)?;
    let quotient = product / denominator;

    u64::try_from(quotient).map_err(|_| {
        LaunchpadError::math_overflow("u128 to u64 narrowing", &[&quotient.to_string()])
    })
}
