/// Shared types for the token launchpad
///
/// This crate provides the launch request and record model, the state
/// machine tags, tier tables, liquidity distribution types and the input
/// error taxonomy shared by the calculators and the orchestrator.

pub mod constants;
pub mod errors;
pub mod launch;
pub mod liquidity;
pub mod tier;
pub mod token;

// Re-export all public types
pub use constants::*;
pub use errors::*;
pub use launch::*;
pub use liquidity::*;
pub use tier::*;
pub use token::*;

/// Result type alias using the shared error type
pub type LaunchpadResult<T> = std::result::Result<T, LaunchpadError>;
