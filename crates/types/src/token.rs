/// Token supply, addresses and metadata attributes

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{ADDRESS_BYTES, PLATFORM_NAME};
use crate::errors::LaunchpadError;
use crate::tier::LaunchTier;
use crate::LaunchpadResult;

/// Supply split between the creator and the liquidity pool, in base units.
///
/// `creator_amount + liquidity_amount == total_supply_base_units` always holds;
/// the flooring remainder goes to liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllocation {
    /// Whole-token supply before scaling by decimals
    pub supply: u64,
    pub decimals: u8,
    pub creator_share_bps: u16,
    pub total_supply_base_units: u64,
    pub creator_amount: u64,
    pub liquidity_amount: u64,
}

impl TokenAllocation {
    /// Scale a whole-token amount to base units with this allocation's decimals
    pub fn to_base_units(&self, tokens: u64) -> LaunchpadResult<u64> {
        10u64
            .checked_pow(self.decimals as u32)
            .and_then(|scale| tokens.checked_mul(scale))
            .ok_or_else(|| {
                LaunchpadError::math_overflow(
                    "base unit scaling",
                    &[&tokens.to_string(), &self.decimals.to_string()],
                )
            })
    }
}

/// Validate that `address` is a base58 ledger address
pub fn validate_address(field: &str, address: &str) -> LaunchpadResult<()> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| LaunchpadError::invalid_request(field, format!("not base58: {}", e)))?;

    if bytes.len() != ADDRESS_BYTES {
        return Err(LaunchpadError::invalid_request(
            field,
            format!("decodes to {} bytes, expected {}", bytes.len(), ADDRESS_BYTES),
        ));
    }

    Ok(())
}

/// Structured attributes published alongside the token logo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttributes {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub supply: u64,
    pub decimals: u8,
    pub tier: LaunchTier,
    pub creator: String,
    pub platform: String,
}

impl MetadataAttributes {
    pub fn new(
        name: &str,
        symbol: &str,
        description: Option<&str>,
        supply: u64,
        decimals: u8,
        tier: LaunchTier,
        creator: &str,
    ) -> Self {
        let description = description
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} ({}) - Created with {}", name, symbol, PLATFORM_NAME));

        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            description,
            supply,
            decimals,
            tier,
            creator: creator.to_string(),
            platform: PLATFORM_NAME.to_string(),
        }
    }

    /// Render the off-chain metadata JSON document pointing at `image_locator`
    pub fn to_document(&self, image_locator: &str) -> Value {
        json!({
            "name": self.name,
            "symbol": self.symbol,
            "description": self.description,
            "image": image_locator,
            "attributes": [
                { "trait_type": "Supply", "value": self.supply },
                { "trait_type": "Decimals", "value": self.decimals },
                { "trait_type": "Launch Type", "value": self.tier.as_str() },
                { "trait_type": "Platform", "value": self.platform },
            ],
            "properties": {
                "category": "token",
                "creators": [
                    { "address": self.creator, "verified": false, "share": 100 }
                ],
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    #[test]
    fn test_validate_address() {
        assert!(validate_address("creator", CREATOR).is_ok());
        assert!(validate_address("creator", "not-base58-0OIl").is_err());
        assert!(validate_address("creator", "abc").is_err());
    }

    #[test]
    fn test_to_base_units() {
        let allocation = TokenAllocation {
            supply: 1_000,
            decimals: 9,
            creator_share_bps: 8_000,
            total_supply_base_units: 1_000_000_000_000,
            creator_amount: 800_000_000_000,
            liquidity_amount: 200_000_000_000,
        };
        assert_eq!(allocation.to_base_units(1_000).unwrap(), 1_000_000_000_000);
        assert!(allocation.to_base_units(u64::MAX).is_err());
    }

    #[test]
    fn test_metadata_document() {
        let attrs = MetadataAttributes::new(
            "Moon Cat",
            "MCAT",
            None,
            1_000_000_000,
            9,
            LaunchTier::Premium,
            CREATOR,
        );
        assert_eq!(
            attrs.description,
            "Moon Cat (MCAT) - Created with Meteora Token Launcher"
        );

        let doc = attrs.to_document("ipfs://QmLogo");
        assert_eq!(doc["image"], "ipfs://QmLogo");
        assert_eq!(doc["attributes"][2]["value"], "premium");
        assert_eq!(doc["properties"]["creators"][0]["address"], CREATOR);
    }
}
