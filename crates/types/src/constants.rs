/// Launchpad constants shared by the calculators and the orchestrator

// ============================================================================
// Basis Point Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum percentage in basis points (100%)
pub const MAX_BPS: u16 = 10_000;

// ============================================================================
// Token Constants
// ============================================================================

/// Maximum token decimals accepted by the allocation calculator
pub const MAX_DECIMALS: u8 = 18;

/// Default total supply in whole tokens
pub const DEFAULT_SUPPLY: u64 = 1_000_000_000;

/// Default token decimals
pub const DEFAULT_DECIMALS: u8 = 9;

/// Default creator share (80%)
pub const DEFAULT_CREATOR_SHARE_BPS: u16 = 8_000;

/// Maximum token name length in characters
pub const MAX_NAME_LEN: usize = 32;

/// Maximum token symbol length in characters
pub const MAX_SYMBOL_LEN: usize = 10;

/// Maximum free-form description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Length in bytes of a decoded ledger address
pub const ADDRESS_BYTES: usize = 32;

// ============================================================================
// Bin and Price Constants
// ============================================================================

/// Minimum bin id supported by the pool program
pub const MIN_BIN_ID: i32 = -443_636;

/// Maximum bin id supported by the pool program
pub const MAX_BIN_ID: i32 = 443_636;

/// Widest liquidity curve radius the builder will expand
pub const MAX_BIN_RADIUS: u32 = 1_000;

/// Default liquidity curve radius (bins either side of the active bin)
pub const DEFAULT_BIN_RADIUS: u32 = 10;

/// Default exponential decay applied per bin of distance from the active bin
pub const DEFAULT_CURVE_DECAY: f64 = 0.1;

/// Fixed-point scale used to quantise curve weights before integer division
pub const CURVE_WEIGHT_SCALE: f64 = 1e12;

// ============================================================================
// Network Constants
// ============================================================================

/// Wrapped SOL mint, the default quote token
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Platform name embedded in token metadata
pub const PLATFORM_NAME: &str = "Meteora Token Launcher";

// ============================================================================
// Tier Constants
// ============================================================================

/// Version of the static tier table; bump whenever a tier value changes
pub const TIER_CONFIG_VERSION: u16 = 1;
