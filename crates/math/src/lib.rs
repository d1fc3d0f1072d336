/// Calculators for the token launchpad
///
/// Pure, deterministic functions: supply allocation, the price to bin-id
/// ladder and the liquidity curve used to seed a new pool. None of them
/// touch external state, so they are safe to call from any task.

pub mod allocation;
pub mod bin_price;
pub mod liquidity_curve;
pub mod safe;

// Re-export commonly used functions
pub use allocation::*;
pub use bin_price::*;
pub use liquidity_curve::*;
pub use safe::*;
