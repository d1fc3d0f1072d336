/// Bin-based liquidity distribution types

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BIN_RADIUS, DEFAULT_CURVE_DECAY};

/// Tunables for the liquidity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Number of bins either side of the active bin
    pub radius: u32,
    /// Exponential decay per bin of distance from the active bin
    pub decay: f64,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BIN_RADIUS,
            decay: DEFAULT_CURVE_DECAY,
        }
    }
}

/// Liquidity placed in a single bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinLiquidity {
    pub bin_id: i32,
    pub base_amount: u64,
    pub quote_amount: u64,
}

impl BinLiquidity {
    pub fn total(&self) -> u64 {
        self.base_amount + self.quote_amount
    }
}

/// Ordered per-bin allocation covering `[active - radius, active + radius]`.
///
/// Only the active bin may hold both a base and a quote amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinDistribution {
    pub active_bin: i32,
    pub bins: Vec<BinLiquidity>,
}

impl BinDistribution {
    pub fn lower_bin(&self) -> Option<i32> {
        self.bins.first().map(|b| b.bin_id)
    }

    pub fn upper_bin(&self) -> Option<i32> {
        self.bins.last().map(|b| b.bin_id)
    }

    /// Total liquidity across both sides
    pub fn total_amount(&self) -> u64 {
        self.bins.iter().map(BinLiquidity::total).sum()
    }

    pub fn active(&self) -> Option<&BinLiquidity> {
        self.bins.iter().find(|b| b.bin_id == self.active_bin)
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
