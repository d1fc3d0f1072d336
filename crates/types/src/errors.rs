use thiserror::Error;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Input errors raised by the launchpad calculators and request validation.
///
/// None of these are retryable: they describe a caller mistake and are
/// surfaced before any external system is contacted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LaunchpadError {
    // ========================================================================
    // Calculator Errors
    // ========================================================================

    /// Supply, decimals or share cannot produce a valid allocation
    #[error("Invalid allocation input: {reason}")]
    InvalidAllocationInput { reason: String },

    /// Price or bin step cannot be mapped onto the bin ladder
    #[error("Invalid price input: {reason}")]
    InvalidPriceInput { reason: String },

    /// Bin range or amount cannot produce a liquidity curve
    #[error("Invalid curve input: {reason}")]
    InvalidCurveInput { reason: String },

    // ========================================================================
    // Request Errors
    // ========================================================================

    /// A launch request field failed validation
    #[error("Invalid request field '{field}': {reason}")]
    InvalidRequest { field: String, reason: String },

    // ========================================================================
    // Math Errors
    // ========================================================================

    /// Arithmetic overflow occurred
    #[error("Math overflow in '{operation}' with values: {values:?}")]
    MathOverflow { operation: String, values: Vec<String> },
}

impl LaunchpadError {
    /// Create an invalid allocation input error
    pub fn invalid_allocation(reason: impl Into<String>) -> Self {
        Self::InvalidAllocationInput { reason: reason.into() }
    }

    /// Create an invalid price input error
    pub fn invalid_price(reason: impl Into<String>) -> Self {
        Self::InvalidPriceInput { reason: reason.into() }
    }

    /// Create an invalid curve input error
    pub fn invalid_curve(reason: impl Into<String>) -> Self {
        Self::InvalidCurveInput { reason: reason.into() }
    }

    /// Create an invalid request error
    pub fn invalid_request(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a math overflow error with context
    pub fn math_overflow(operation: &str, values: &[&str]) -> Self {
        Self::MathOverflow {
            operation: operation.to_string(),
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LaunchpadError::invalid_request("symbol", "must be uppercase");
        assert_eq!(
            err.to_string(),
            "Invalid request field 'symbol': must be uppercase"
        );

        let err = LaunchpadError::math_overflow("supply scaling", &["10", "20"]);
        assert!(err.to_string().contains("supply scaling"));
    }
}
