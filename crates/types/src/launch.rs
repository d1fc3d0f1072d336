/// Launch request, state machine and persisted launch record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::constants::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_SYMBOL_LEN};
use crate::errors::LaunchpadError;
use crate::liquidity::CurveParams;
use crate::tier::{LaunchTier, PoolTierConfig};
use crate::token::{validate_address, TokenAllocation};
use crate::LaunchpadResult;

// ============================================================================
// Request
// ============================================================================

/// Logo image supplied with a launch request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoAsset {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoAsset")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Immutable user input for a launch. Validated once at orchestrator entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    pub creator_address: String,
    pub tier: LaunchTier,
    pub logo: LogoAsset,
    /// Target initial price, quote tokens per base token
    pub initial_price: f64,
}

impl LaunchRequest {
    /// Structural validation that does not depend on configuration
    pub fn validate(&self) -> LaunchpadResult<()> {
        let name_len = self.name.chars().count();
        if self.name.trim().is_empty() || name_len > MAX_NAME_LEN {
            return Err(LaunchpadError::invalid_request(
                "name",
                format!("must be 1-{} characters, got {}", MAX_NAME_LEN, name_len),
            ));
        }

        if self.symbol.is_empty() || self.symbol.len() > MAX_SYMBOL_LEN {
            return Err(LaunchpadError::invalid_request(
                "symbol",
                format!("must be 1-{} characters, got {}", MAX_SYMBOL_LEN, self.symbol.len()),
            ));
        }
        if !self
            .symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(LaunchpadError::invalid_request(
                "symbol",
                "must be uppercase alphanumeric",
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(LaunchpadError::invalid_request(
                    "description",
                    format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
                ));
            }
        }

        validate_address("creator_address", &self.creator_address)?;

        if self.logo.bytes.is_empty() {
            return Err(LaunchpadError::invalid_request("logo", "is empty"));
        }

        if !self.initial_price.is_finite() || self.initial_price <= 0.0 {
            return Err(LaunchpadError::invalid_request(
                "initial_price",
                format!("must be a positive number, got {}", self.initial_price),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// An external write performed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStep {
    PublishMetadata,
    MintToken,
    CreatePool,
    SeedLiquidity,
    ActivateProtection,
}

impl LaunchStep {
    /// Checkpoint reached once this step's side effect is recorded
    pub fn reached(&self) -> Checkpoint {
        match self {
            LaunchStep::PublishMetadata => Checkpoint::MetadataPublished,
            LaunchStep::MintToken => Checkpoint::TokenMinted,
            LaunchStep::CreatePool => Checkpoint::PoolProvisioned,
            LaunchStep::SeedLiquidity => Checkpoint::LiquidityConfigured,
            LaunchStep::ActivateProtection => Checkpoint::AntiSniperActivated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchStep::PublishMetadata => "publish_metadata",
            LaunchStep::MintToken => "mint_token",
            LaunchStep::CreatePool => "create_pool",
            LaunchStep::SeedLiquidity => "seed_liquidity",
            LaunchStep::ActivateProtection => "activate_protection",
        }
    }
}

impl fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last durably completed point of a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Checkpoint {
    Created,
    MetadataPublished,
    TokenMinted,
    PoolProvisioned,
    LiquidityConfigured,
    AntiSniperActivated,
}

impl Checkpoint {
    /// Step that moves the launch forward from here, `None` when complete
    pub fn next_step(&self, anti_sniper: bool) -> Option<LaunchStep> {
        match self {
            Checkpoint::Created => Some(LaunchStep::PublishMetadata),
            Checkpoint::MetadataPublished => Some(LaunchStep::MintToken),
            Checkpoint::TokenMinted => Some(LaunchStep::CreatePool),
            Checkpoint::PoolProvisioned => Some(LaunchStep::SeedLiquidity),
            Checkpoint::LiquidityConfigured if anti_sniper => Some(LaunchStep::ActivateProtection),
            Checkpoint::LiquidityConfigured => None,
            Checkpoint::AntiSniperActivated => None,
        }
    }

    /// Cancellation is only offered before anything irreversible happened
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Checkpoint::Created | Checkpoint::MetadataPublished)
    }
}

/// Classification of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A calculator rejected the launch inputs
    InvalidInput,
    /// A collaborator definitively refused the write
    Rejected,
    /// The outcome of a write could not be established
    Ambiguous,
    /// Transient failures outlasted the retry budget
    RetriesExhausted,
    /// The launch was cancelled before any irreversible step
    Cancelled,
    /// Progress could not be persisted
    Storage,
}

impl FailureKind {
    /// Whether an explicit retry may re-drive a launch that failed this way
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::InvalidInput | FailureKind::Cancelled)
    }
}

/// Why a launch failed and at which step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub step: Option<LaunchStep>,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureCause {
    pub fn new(step: Option<LaunchStep>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            step,
            kind,
            message: message.into(),
        }
    }
}

/// Launch state tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LaunchState {
    Created,
    MetadataPublished,
    TokenMinted,
    PoolProvisioned,
    LiquidityConfigured,
    AntiSniperActivated,
    Completed,
    /// Absorbing state; `at` is the last checkpoint that completed
    Failed { at: Checkpoint, cause: FailureCause },
}

impl LaunchState {
    /// Checkpoint for non-terminal states
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self {
            LaunchState::Created => Some(Checkpoint::Created),
            LaunchState::MetadataPublished => Some(Checkpoint::MetadataPublished),
            LaunchState::TokenMinted => Some(Checkpoint::TokenMinted),
            LaunchState::PoolProvisioned => Some(Checkpoint::PoolProvisioned),
            LaunchState::LiquidityConfigured => Some(Checkpoint::LiquidityConfigured),
            LaunchState::AntiSniperActivated => Some(Checkpoint::AntiSniperActivated),
            LaunchState::Completed | LaunchState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Completed | LaunchState::Failed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LaunchState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            LaunchState::Created => "created",
            LaunchState::MetadataPublished => "metadata_published",
            LaunchState::TokenMinted => "token_minted",
            LaunchState::PoolProvisioned => "pool_provisioned",
            LaunchState::LiquidityConfigured => "liquidity_configured",
            LaunchState::AntiSniperActivated => "anti_sniper_activated",
            LaunchState::Completed => "completed",
            LaunchState::Failed { .. } => "failed",
        }
    }
}

impl From<Checkpoint> for LaunchState {
    fn from(checkpoint: Checkpoint) -> Self {
        match checkpoint {
            Checkpoint::Created => LaunchState::Created,
            Checkpoint::MetadataPublished => LaunchState::MetadataPublished,
            Checkpoint::TokenMinted => LaunchState::TokenMinted,
            Checkpoint::PoolProvisioned => LaunchState::PoolProvisioned,
            Checkpoint::LiquidityConfigured => LaunchState::LiquidityConfigured,
            Checkpoint::AntiSniperActivated => LaunchState::AntiSniperActivated,
        }
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchState::Failed { at, cause } => {
                write!(f, "failed at {:?} ({:?}): {}", at, cause.kind, cause.message)
            }
            other => f.write_str(other.name()),
        }
    }
}

// ============================================================================
// Receipts
// ============================================================================

/// Content-addressed locator for the published logo and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedMetadata {
    pub locator: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedToken {
    pub mint_address: String,
    pub mint_receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedPool {
    pub pool_address: String,
    pub base_mint: String,
    pub quote_mint: String,
    pub bin_step_bps: u16,
    pub base_fee_bps: u16,
    pub active_bin: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub receipt: String,
    pub bin_count: usize,
    pub total_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionReceipt {
    pub receipt: String,
    pub delay_secs: u64,
    /// Buy cap in base units
    pub max_buy_per_tx: u64,
    pub activates_at: DateTime<Utc>,
}

// ============================================================================
// Audit Trail
// ============================================================================

/// Outcome of a single collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    /// Found already applied by a reconciliation read
    Reconciled,
    Transient(String),
    Ambiguous(String),
    Rejected(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded | AttemptOutcome::Reconciled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAttempt {
    pub step: LaunchStep,
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: LaunchState,
    pub to: LaunchState,
    pub at: DateTime<Utc>,
}

/// External trading links for a launched token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingLinks {
    pub jupiter_url: String,
    pub dexscreener_url: String,
    pub meteora_url: Option<String>,
}

// ============================================================================
// Launch Record
// ============================================================================

/// Persisted state of one launch and the audit trail of what it did.
///
/// Records are never deleted; they end as `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub id: Uuid,
    pub request: LaunchRequest,
    pub tier_config: PoolTierConfig,
    pub curve: CurveParams,
    pub quote_mint: String,
    pub allocation: Option<TokenAllocation>,
    /// Fixed at planning time and reused by every provisioning attempt
    pub active_bin: Option<i32>,
    pub state: LaunchState,

    pub metadata: Option<PublishedMetadata>,
    pub mint: Option<MintedToken>,
    /// Mint address reported by an ambiguous mint, pending reconciliation
    pub unconfirmed_mint: Option<String>,
    pub pool: Option<ProvisionedPool>,
    /// Set before a liquidity deposit is submitted, cleared once its outcome is known
    pub liquidity_pending: bool,
    pub liquidity: Option<LiquidityReceipt>,
    pub protection: Option<ProtectionReceipt>,

    pub attempts: Vec<StepAttempt>,
    pub transitions: Vec<StateTransition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LaunchRecord {
    pub fn new(
        id: Uuid,
        request: LaunchRequest,
        tier_config: PoolTierConfig,
        curve: CurveParams,
        quote_mint: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            request,
            tier_config,
            curve,
            quote_mint: quote_mint.to_string(),
            allocation: None,
            active_bin: None,
            state: LaunchState::Created,
            metadata: None,
            mint: None,
            unconfirmed_mint: None,
            pool: None,
            liquidity_pending: false,
            liquidity: None,
            protection: None,
            attempts: Vec::new(),
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `to`, appending the transition to the audit trail
    pub fn transition_to(&mut self, to: LaunchState) -> StateTransition {
        let now = Utc::now();
        let transition = StateTransition {
            from: self.state.clone(),
            to: to.clone(),
            at: now,
        };
        self.state = to;
        self.updated_at = now;
        self.transitions.push(transition.clone());
        transition
    }

    /// Mark the launch failed at its current checkpoint
    pub fn fail(&mut self, cause: FailureCause) -> StateTransition {
        let at = self.checkpoint();
        self.transition_to(LaunchState::Failed { at, cause })
    }

    pub fn record_attempt(&mut self, step: LaunchStep, attempt: u32, outcome: AttemptOutcome) {
        let now = Utc::now();
        self.attempts.push(StepAttempt {
            step,
            attempt,
            outcome,
            at: now,
        });
        self.updated_at = now;
    }

    /// Last completed checkpoint, including the one a failure stopped at
    pub fn checkpoint(&self) -> Checkpoint {
        match &self.state {
            LaunchState::Failed { at, .. } => *at,
            LaunchState::Completed => {
                if self.protection.is_some() {
                    Checkpoint::AntiSniperActivated
                } else {
                    Checkpoint::LiquidityConfigured
                }
            }
            state => state.checkpoint().unwrap_or(Checkpoint::Created),
        }
    }

    pub fn attempts_for(&self, step: LaunchStep) -> usize {
        self.attempts.iter().filter(|a| a.step == step).count()
    }

    pub fn successes_for(&self, step: LaunchStep) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.step == step && a.outcome.is_success())
            .count()
    }

    pub fn failure(&self) -> Option<&FailureCause> {
        match &self.state {
            LaunchState::Failed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn mint_address(&self) -> Option<&str> {
        self.mint.as_ref().map(|m| m.mint_address.as_str())
    }

    pub fn pool_address(&self) -> Option<&str> {
        self.pool.as_ref().map(|p| p.pool_address.as_str())
    }

    /// Trading links, available once the token has been minted
    pub fn trading_links(&self) -> Option<TradingLinks> {
        let mint = self.mint_address()?;
        Some(TradingLinks {
            jupiter_url: format!("https://jup.ag/swap/{}-{}", self.quote_mint, mint),
            dexscreener_url: format!("https://dexscreener.com/solana/{}", mint),
            meteora_url: self
                .pool_address()
                .map(|pool| format!("https://app.meteora.ag/pools/{}", pool)),
        })
    }
}

// Logo bytes travel as base64 inside JSON records
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LaunchRequest {
        LaunchRequest {
            name: "Moon Cat".to_string(),
            symbol: "MCAT".to_string(),
            description: None,
            creator_address: "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string(),
            tier: LaunchTier::Basic,
            logo: LogoAsset {
                content_type: "image/png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            },
            initial_price: 0.0001,
        }
    }

    fn record() -> LaunchRecord {
        LaunchRecord::new(
            Uuid::new_v4(),
            request(),
            PoolTierConfig::for_tier(LaunchTier::Basic),
            CurveParams::default(),
            "So11111111111111111111111111111111111111112",
        )
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut bad = request();
        bad.symbol = "mcat".to_string();
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.name = "x".repeat(33);
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.symbol = "ABCDEFGHIJK".to_string();
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.initial_price = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.initial_price = f64::NAN;
        assert!(bad.validate().is_err());

        let mut bad = request();
        bad.logo.bytes.clear();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_step_order() {
        let mut checkpoint = Checkpoint::Created;
        let mut steps = Vec::new();
        while let Some(step) = checkpoint.next_step(true) {
            steps.push(step);
            checkpoint = step.reached();
        }
        assert_eq!(
            steps,
            vec![
                LaunchStep::PublishMetadata,
                LaunchStep::MintToken,
                LaunchStep::CreatePool,
                LaunchStep::SeedLiquidity,
                LaunchStep::ActivateProtection,
            ]
        );

        assert_eq!(Checkpoint::LiquidityConfigured.next_step(false), None);
    }

    #[test]
    fn test_cancellable_checkpoints() {
        assert!(Checkpoint::Created.is_cancellable());
        assert!(Checkpoint::MetadataPublished.is_cancellable());
        assert!(!Checkpoint::TokenMinted.is_cancellable());
    }

    #[test]
    fn test_fail_keeps_checkpoint() {
        let mut record = record();
        record.transition_to(LaunchState::MetadataPublished);
        record.transition_to(LaunchState::TokenMinted);
        record.fail(FailureCause::new(
            Some(LaunchStep::CreatePool),
            FailureKind::Rejected,
            "insufficient funds",
        ));

        assert_eq!(record.checkpoint(), Checkpoint::TokenMinted);
        assert_eq!(record.transitions.len(), 3);
        assert!(record.state.is_terminal());
        assert_eq!(record.failure().unwrap().kind, FailureKind::Rejected);
    }

    #[test]
    fn test_attempt_counters() {
        let mut record = record();
        record.record_attempt(
            LaunchStep::CreatePool,
            1,
            AttemptOutcome::Transient("timeout".to_string()),
        );
        record.record_attempt(LaunchStep::CreatePool, 2, AttemptOutcome::Succeeded);

        assert_eq!(record.attempts_for(LaunchStep::CreatePool), 2);
        assert_eq!(record.successes_for(LaunchStep::CreatePool), 1);
        assert_eq!(record.attempts_for(LaunchStep::MintToken), 0);
    }

    #[test]
    fn test_record_json_roundtrip_keeps_logo() {
        let record = record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("iVBORw")); // base64 of the PNG magic
        let decoded: LaunchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.request.logo.bytes, record.request.logo.bytes);
    }

    #[test]
    fn test_trading_links_require_mint() {
        let mut record = record();
        assert!(record.trading_links().is_none());

        record.mint = Some(MintedToken {
            mint_address: "Mint111".to_string(),
            mint_receipt: "sig".to_string(),
        });
        let links = record.trading_links().unwrap();
        assert!(links.jupiter_url.ends_with("-Mint111"));
        assert!(links.meteora_url.is_none());
    }
}
