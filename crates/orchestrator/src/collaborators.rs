//! Collaborator ports consumed by the orchestrator
//!
//! Implementations own the actual object storage, ledger and pool program
//! clients. The orchestrator only relies on the contracts below and on the
//! error classification each port reports.

use std::sync::Arc;

use async_trait::async_trait;
use launchpad_types::{
    BinDistribution, LiquidityReceipt, MetadataAttributes, MintedToken, PublishedMetadata,
};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Network or timeout class failure; safe to retry
    #[error("Transient publish failure: {0}")]
    Transient(String),

    /// The content itself was refused (bad image, oversized file)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Publish rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    /// Failed before anything was submitted; safe to retry
    #[error("Transient mint failure: {0}")]
    Transient(String),

    /// Submitted but confirmation is unknown; the mint may exist
    #[error("Mint outcome unknown for {mint_address}: {reason}")]
    Ambiguous { mint_address: String, reason: String },

    /// Definitively refused (insufficient funds, duplicate symbol)
    #[error("Mint rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Not applied; safe to retry
    #[error("Transient provisioning failure: {0}")]
    Transient(String),

    #[error("Provisioning rejected: {0}")]
    Rejected(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Transient(_))
    }
}

impl MintError {
    pub fn is_transient(&self) -> bool {
        matches!(self, MintError::Transient(_))
    }
}

impl ProvisionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProvisionError::Transient(_))
    }
}

// ============================================================================
// Requests and Receipts
// ============================================================================

/// Everything the ledger needs to create the token and split its supply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    /// Address reserved for this submission
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    pub metadata_locator: String,
    pub creator_address: String,
    pub creator_amount: u64,
    pub liquidity_amount: u64,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePoolRequest {
    pub base_mint: String,
    pub quote_mint: String,
    pub bin_step_bps: u16,
    pub base_fee_bps: u16,
    pub active_bin: i32,
    pub activation_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPool {
    pub pool_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionActivated {
    pub receipt: String,
}

// ============================================================================
// Ports
// ============================================================================

/// Object storage for the logo and its attributes
#[async_trait]
pub trait MetadataPublisher: Send + Sync {
    /// Publish `bytes` with `attributes`, returning a content-addressed locator
    async fn publish(
        &self,
        bytes: &[u8],
        content_type: &str,
        attributes: &MetadataAttributes,
    ) -> Result<PublishedMetadata, PublishError>;
}

/// Ledger client that creates the fungible asset
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Reserve the address the next submission of `request` will create.
    ///
    /// Known before anything is sent, so an interrupted submission can be
    /// checked with `find_mint`.
    async fn reserve_mint_address(&self, request: &MintRequest) -> Result<String, MintError>;

    async fn mint(&self, request: &MintRequest) -> Result<MintedToken, MintError>;

    /// Look up a previously submitted mint; `Ok(None)` proves it does not exist
    async fn find_mint(&self, mint_address: &str) -> Result<Option<MintedToken>, MintError>;
}

/// Pool program client
#[async_trait]
pub trait PoolProvisioner: Send + Sync {
    async fn create_pool(&self, request: &CreatePoolRequest) -> Result<CreatedPool, ProvisionError>;

    async fn seed_liquidity(
        &self,
        pool_address: &str,
        distribution: &BinDistribution,
    ) -> Result<LiquidityReceipt, ProvisionError>;

    /// Look up an existing deposit; `Ok(None)` proves nothing was deposited
    async fn find_liquidity(&self, pool_address: &str) -> Result<Option<LiquidityReceipt>, ProvisionError>;

    /// Configure the anti-sniper window: trading delay plus a per-transaction buy cap
    async fn activate_protection(
        &self,
        pool_address: &str,
        delay_secs: u64,
        max_buy_per_tx: u64,
    ) -> Result<ProtectionActivated, ProvisionError>;
}

/// External systems a launch writes to
#[derive(Clone)]
pub struct Collaborators {
    pub publisher: Arc<dyn MetadataPublisher>,
    pub minter: Arc<dyn TokenMinter>,
    pub provisioner: Arc<dyn PoolProvisioner>,
}
