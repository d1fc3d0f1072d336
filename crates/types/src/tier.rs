/// Launch tiers and their static pool configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{LAMPORTS_PER_SOL, TIER_CONFIG_VERSION};
use crate::errors::LaunchpadError;

/// Launch tier chosen by the creator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchTier {
    Basic,
    Premium,
}

impl LaunchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchTier::Basic => "basic",
            LaunchTier::Premium => "premium",
        }
    }

    /// Static pool configuration for this tier
    pub fn config(&self) -> PoolTierConfig {
        PoolTierConfig::for_tier(*self)
    }
}

impl fmt::Display for LaunchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LaunchTier {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(LaunchTier::Basic),
            "premium" => Ok(LaunchTier::Premium),
            other => Err(LaunchpadError::invalid_request(
                "tier",
                format!("unknown tier '{}', expected 'basic' or 'premium'", other),
            )),
        }
    }
}

/// Pool configuration selected by tier.
///
/// Tiers are versioned static data and are never read from user input or
/// configuration files. A launch snapshots its tier config at creation so a
/// later table change cannot alter a launch mid-flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTierConfig {
    pub tier: LaunchTier,
    /// Version of the tier table this snapshot came from
    pub version: u16,
    /// Price step between adjacent bins, in basis points
    pub bin_step_bps: u16,
    /// Base swap fee, in basis points
    pub base_fee_bps: u16,
    /// Delay before trading activates, in seconds
    pub activation_delay_secs: u64,
    /// Whether the anti-sniper vault is configured after seeding
    pub anti_sniper: bool,
    /// Whole-token buy cap per transaction during the protection window
    pub max_buy_per_tx_tokens: u64,
    /// Fee charged to the creator for this tier, in lamports
    pub launch_fee_lamports: u64,
}

impl PoolTierConfig {
    pub fn for_tier(tier: LaunchTier) -> Self {
        match tier {
            LaunchTier::Basic => Self {
                tier,
                version: TIER_CONFIG_VERSION,
                bin_step_bps: 100,
                base_fee_bps: 25,
                activation_delay_secs: 0,
                anti_sniper: false,
                max_buy_per_tx_tokens: 0,
                launch_fee_lamports: LAMPORTS_PER_SOL / 50, // 0.02 SOL
            },
            LaunchTier::Premium => Self {
                tier,
                version: TIER_CONFIG_VERSION,
                bin_step_bps: 50,
                base_fee_bps: 25,
                activation_delay_secs: 300,
                anti_sniper: true,
                max_buy_per_tx_tokens: 1_000,
                launch_fee_lamports: LAMPORTS_PER_SOL / 10, // 0.1 SOL
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!("basic".parse::<LaunchTier>().unwrap(), LaunchTier::Basic);
        assert_eq!("PREMIUM".parse::<LaunchTier>().unwrap(), LaunchTier::Premium);
        assert!("gold".parse::<LaunchTier>().is_err());
    }

    #[test]
    fn test_tier_table() {
        let basic = PoolTierConfig::for_tier(LaunchTier::Basic);
        assert_eq!(basic.bin_step_bps, 100);
        assert!(!basic.anti_sniper);
        assert_eq!(basic.launch_fee_lamports, 20_000_000);

        let premium = LaunchTier::Premium.config();
        assert_eq!(premium.bin_step_bps, 50);
        assert_eq!(premium.activation_delay_secs, 300);
        assert!(premium.anti_sniper);
        assert_eq!(premium.launch_fee_lamports, 100_000_000);
    }

    #[test]
    fn test_tier_serde_lowercase() {
        let json = serde_json::to_string(&LaunchTier::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
    }
}
