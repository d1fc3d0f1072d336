//! Deterministic in-process collaborators
//!
//! These stand in for object storage, the ledger and the pool program so the
//! full workflow can run without network access. Addresses and content hashes
//! are derived with SHA-256, so the same inputs always produce the same
//! locators and addresses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use launchpad_types::{BinDistribution, LiquidityReceipt, MetadataAttributes, MintedToken, PublishedMetadata};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::collaborators::{
    Collaborators, CreatePoolRequest, CreatedPool, MetadataPublisher, MintError, MintRequest,
    PoolProvisioner, ProtectionActivated, ProvisionError, PublishError, TokenMinter,
};

/// Base58 encoding of SHA-256 over `parts`; always 32 bytes, so a valid address
fn derive_address(parts: &[&[u8]]) -> String {
    bs58::encode(digest(parts)).into_string()
}

fn digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Default)]
pub struct SimulatedMetadataPublisher {
    latency: Duration,
    documents: Mutex<HashMap<String, serde_json::Value>>,
}

impl SimulatedMetadataPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Metadata document stored under `locator`, if published
    pub async fn document(&self, locator: &str) -> Option<serde_json::Value> {
        self.documents.lock().await.get(locator).cloned()
    }
}

#[async_trait]
impl MetadataPublisher for SimulatedMetadataPublisher {
    async fn publish(
        &self,
        bytes: &[u8],
        content_type: &str,
        attributes: &MetadataAttributes,
    ) -> Result<PublishedMetadata, PublishError> {
        simulate_latency(self.latency).await;

        if !content_type.starts_with("image/") {
            return Err(PublishError::InvalidContent(format!(
                "expected an image, got {}",
                content_type
            )));
        }

        let image_hash = hex::encode(digest(&[bytes]));
        let image_locator = format!("ipfs://{}", derive_address(&[b"image", bytes]));
        let document = attributes.to_document(&image_locator);

        let serialized = serde_json::to_vec(&document)
            .map_err(|e| PublishError::InvalidContent(format!("unserializable attributes: {}", e)))?;
        let locator = format!("ipfs://{}", derive_address(&[b"metadata", serialized.as_slice()]));

        debug!(%locator, %image_hash, "Simulated metadata publish");
        self.documents.lock().await.insert(locator.clone(), document);

        Ok(PublishedMetadata {
            locator,
            content_hash: image_hash,
        })
    }
}

// ============================================================================
// Ledger
// ============================================================================

#[derive(Default)]
pub struct SimulatedTokenMinter {
    latency: Duration,
    mints: Mutex<HashMap<String, MintedToken>>,
}

impl SimulatedTokenMinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Address a mint request resolves to, ignoring any reserved address
    pub fn mint_address_for(request: &MintRequest) -> String {
        derive_address(&[
            b"mint",
            request.symbol.as_bytes(),
            request.creator_address.as_bytes(),
            request.metadata_locator.as_bytes(),
        ])
    }
}

#[async_trait]
impl TokenMinter for SimulatedTokenMinter {
    async fn reserve_mint_address(&self, request: &MintRequest) -> Result<String, MintError> {
        Ok(Self::mint_address_for(request))
    }

    async fn mint(&self, request: &MintRequest) -> Result<MintedToken, MintError> {
        simulate_latency(self.latency).await;

        let mint_address = request.mint_address.clone();
        if mint_address.is_empty() {
            return Err(MintError::Rejected("no mint address reserved".to_string()));
        }
        let mut mints = self.mints.lock().await;
        if mints.contains_key(&mint_address) {
            return Err(MintError::Rejected(format!("mint {} already exists", mint_address)));
        }

        let minted = MintedToken {
            mint_receipt: derive_address(&[b"mint-receipt", mint_address.as_bytes()]),
            mint_address: mint_address.clone(),
        };
        debug!(mint = %mint_address, creator_amount = request.creator_amount, "Simulated mint");
        mints.insert(mint_address, minted.clone());

        Ok(minted)
    }

    async fn find_mint(&self, mint_address: &str) -> Result<Option<MintedToken>, MintError> {
        Ok(self.mints.lock().await.get(mint_address).cloned())
    }
}

// ============================================================================
// Pool program
// ============================================================================

#[derive(Default)]
pub struct SimulatedPoolProvisioner {
    latency: Duration,
    pools: Mutex<HashMap<String, CreatePoolRequest>>,
    deposits: Mutex<HashMap<String, LiquidityReceipt>>,
}

impl SimulatedPoolProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PoolProvisioner for SimulatedPoolProvisioner {
    async fn create_pool(&self, request: &CreatePoolRequest) -> Result<CreatedPool, ProvisionError> {
        simulate_latency(self.latency).await;

        let pool_address = derive_address(&[
            b"pool",
            request.base_mint.as_bytes(),
            request.quote_mint.as_bytes(),
            &request.bin_step_bps.to_le_bytes(),
        ]);

        let mut pools = self.pools.lock().await;
        if pools.contains_key(&pool_address) {
            return Err(ProvisionError::Rejected(format!("pool {} already exists", pool_address)));
        }

        debug!(pool = %pool_address, active_bin = request.active_bin, "Simulated pool creation");
        pools.insert(pool_address.clone(), request.clone());

        Ok(CreatedPool { pool_address })
    }

    async fn seed_liquidity(
        &self,
        pool_address: &str,
        distribution: &BinDistribution,
    ) -> Result<LiquidityReceipt, ProvisionError> {
        simulate_latency(self.latency).await;

        if !self.pools.lock().await.contains_key(pool_address) {
            return Err(ProvisionError::Rejected(format!("unknown pool {}", pool_address)));
        }

        let mut deposits = self.deposits.lock().await;
        if deposits.contains_key(pool_address) {
            return Err(ProvisionError::Rejected(format!("pool {} already seeded", pool_address)));
        }

        let receipt = LiquidityReceipt {
            receipt: derive_address(&[b"deposit", pool_address.as_bytes()]),
            bin_count: distribution.len(),
            total_amount: distribution.total_amount(),
        };
        deposits.insert(pool_address.to_string(), receipt.clone());

        Ok(receipt)
    }

    async fn find_liquidity(&self, pool_address: &str) -> Result<Option<LiquidityReceipt>, ProvisionError> {
        Ok(self.deposits.lock().await.get(pool_address).cloned())
    }

    async fn activate_protection(
        &self,
        pool_address: &str,
        delay_secs: u64,
        max_buy_per_tx: u64,
    ) -> Result<ProtectionActivated, ProvisionError> {
        simulate_latency(self.latency).await;

        if !self.pools.lock().await.contains_key(pool_address) {
            return Err(ProvisionError::Rejected(format!("unknown pool {}", pool_address)));
        }

        Ok(ProtectionActivated {
            receipt: derive_address(&[
                b"alpha-vault",
                pool_address.as_bytes(),
                &delay_secs.to_le_bytes(),
                &max_buy_per_tx.to_le_bytes(),
            ]),
        })
    }
}

/// A full set of simulated collaborators sharing one latency
pub fn simulated_collaborators(latency: Duration) -> Collaborators {
    Collaborators {
        publisher: Arc::new(SimulatedMetadataPublisher::new().with_latency(latency)),
        minter: Arc::new(SimulatedTokenMinter::new().with_latency(latency)),
        provisioner: Arc::new(SimulatedPoolProvisioner::new().with_latency(latency)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_types::{validate_address, LaunchTier};

    fn mint_request() -> MintRequest {
        let mut request = MintRequest {
            mint_address: String::new(),
            name: "Moon Cat".to_string(),
            symbol: "MCAT".to_string(),
            metadata_locator: "ipfs://abc".to_string(),
            creator_address: "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string(),
            creator_amount: 800,
            liquidity_amount: 200,
            decimals: 0,
        };
        request.mint_address = SimulatedTokenMinter::mint_address_for(&request);
        request
    }

    #[tokio::test]
    async fn test_publish_is_content_addressed() {
        let publisher = SimulatedMetadataPublisher::new();
        let attributes = MetadataAttributes::new(
            "Moon Cat",
            "MCAT",
            None,
            1_000,
            0,
            LaunchTier::Basic,
            "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
        );

        let a = publisher.publish(b"png", "image/png", &attributes).await.unwrap();
        let b = publisher.publish(b"png", "image/png", &attributes).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.content_hash.len(), 64);

        let document = publisher.document(&a.locator).await.unwrap();
        assert_eq!(document["symbol"], "MCAT");

        let refused = publisher.publish(b"pdf", "application/pdf", &attributes).await;
        assert!(matches!(refused, Err(PublishError::InvalidContent(_))));
    }

    #[tokio::test]
    async fn test_mint_addresses_are_valid_and_findable() {
        let minter = SimulatedTokenMinter::new();
        let minted = minter.mint(&mint_request()).await.unwrap();

        assert!(validate_address("mint", &minted.mint_address).is_ok());
        assert_eq!(minter.find_mint(&minted.mint_address).await.unwrap(), Some(minted));
        assert_eq!(minter.find_mint("missing").await.unwrap(), None);

        // The ledger refuses a duplicate
        assert!(matches!(minter.mint(&mint_request()).await, Err(MintError::Rejected(_))));
    }
}
