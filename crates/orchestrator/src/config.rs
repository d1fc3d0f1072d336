//! Orchestrator configuration loaded from TOML

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use launchpad_types::{
    validate_address, CurveParams, LaunchpadError, LaunchpadResult, LogoAsset,
    DEFAULT_BIN_RADIUS, DEFAULT_CREATOR_SHARE_BPS, DEFAULT_CURVE_DECAY, DEFAULT_DECIMALS,
    DEFAULT_SUPPLY, WRAPPED_SOL_MINT,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Top-level orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub token: TokenSettings,
    pub pool: PoolSettings,
    pub retry: RetryConfig,
    pub collaborators: CollaboratorSettings,
    pub logo: LogoPolicy,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// Supply and pricing applied to every launch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TokenSettings {
    /// Total supply in whole tokens
    #[validate(range(min = 1))]
    pub supply: u64,
    #[validate(range(max = 18))]
    pub decimals: u8,
    /// Creator share in basis points; 10000 would leave nothing to pool
    #[validate(range(min = 1, max = 9999))]
    pub creator_share_bps: u16,
    pub min_initial_price: f64,
    pub max_initial_price: f64,
}

/// Pool pairing and liquidity curve tunables
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PoolSettings {
    pub quote_mint: String,
    #[validate(range(max = 18))]
    pub quote_decimals: u8,
    #[validate(range(min = 1, max = 1000))]
    pub bin_radius: u32,
    #[validate(range(min = 0.0, max = 10.0))]
    pub curve_decay: f64,
}

/// Retry configuration for transient collaborator failures
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[validate(range(min = 1, max = 20))]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    #[validate(range(min = 1))]
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CollaboratorSettings {
    /// Upper bound on a single publish or provisioning call
    #[validate(range(min = 1, max = 600000))]
    pub call_timeout_ms: u64,
}

/// Accepted logo uploads
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LogoPolicy {
    #[validate(range(min = 1))]
    pub max_bytes: usize,
    #[validate(length(min = 1))]
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding one JSON file per launch
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub structured_logging: bool,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            supply: DEFAULT_SUPPLY,
            decimals: DEFAULT_DECIMALS,
            creator_share_bps: DEFAULT_CREATOR_SHARE_BPS,
            min_initial_price: 0.00001,
            max_initial_price: 1.0,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            quote_mint: WRAPPED_SOL_MINT.to_string(),
            quote_decimals: 9,
            bin_radius: DEFAULT_BIN_RADIUS,
            curve_decay: DEFAULT_CURVE_DECAY,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 30_000,
        }
    }
}

impl Default for LogoPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: "./data/launches".into(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> OrchestratorResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| OrchestratorError::Configuration(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate every section plus the cross-field rules
    pub fn validate(&self) -> OrchestratorResult<()> {
        self.token.validate()?;
        self.pool.validate()?;
        self.retry.validate()?;
        self.collaborators.validate()?;
        self.logo.validate()?;

        let token = &self.token;
        if !(token.min_initial_price > 0.0 && token.min_initial_price <= token.max_initial_price) {
            return Err(OrchestratorError::Configuration(format!(
                "initial price bounds [{}, {}] must be positive and ordered",
                token.min_initial_price, token.max_initial_price
            )));
        }

        validate_address("pool.quote_mint", &self.pool.quote_mint)?;
        self.retry.check_backoff()?;

        Ok(())
    }

    pub fn curve_params(&self) -> CurveParams {
        CurveParams {
            radius: self.pool.bin_radius,
            decay: self.pool.curve_decay,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborators.call_timeout_ms)
    }

    /// Reject initial prices outside the configured window
    pub fn check_initial_price(&self, price: f64) -> LaunchpadResult<()> {
        if price < self.token.min_initial_price || price > self.token.max_initial_price {
            return Err(LaunchpadError::invalid_request(
                "initial_price",
                format!(
                    "{} not in [{}, {}]",
                    price, self.token.min_initial_price, self.token.max_initial_price
                ),
            ));
        }
        Ok(())
    }
}

impl RetryConfig {
    fn check_backoff(&self) -> OrchestratorResult<()> {
        if self.max_delay_ms < self.base_delay_ms {
            return Err(OrchestratorError::Configuration(format!(
                "max_delay_ms {} must be at least base_delay_ms {}",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        if !(self.backoff_multiplier >= 1.0 && self.backoff_multiplier.is_finite()) {
            return Err(OrchestratorError::Configuration(format!(
                "backoff_multiplier {} must be at least 1.0",
                self.backoff_multiplier
            )));
        }

        Ok(())
    }

    /// Delay before retry number `retry` (0-based), capped at `max_delay_ms`
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let exponential = self.base_delay_ms as f64 * self.backoff_multiplier.powi(retry as i32);
        Duration::from_millis((exponential as u64).min(self.max_delay_ms))
    }

    /// Total attempts allowed for one step, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl LogoPolicy {
    pub fn check(&self, logo: &LogoAsset) -> LaunchpadResult<()> {
        if logo.bytes.len() > self.max_bytes {
            return Err(LaunchpadError::invalid_request(
                "logo",
                format!("{} bytes exceeds limit of {}", logo.bytes.len(), self.max_bytes),
            ));
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&logo.content_type))
        {
            return Err(LaunchpadError::invalid_request(
                "logo",
                format!("content type '{}' not allowed", logo.content_type),
            ));
        }

        Ok(())
    }
}

/// Write an example configuration file
pub fn create_example_config(path: impl AsRef<Path>) -> OrchestratorResult<()> {
    let example = OrchestratorConfig {
        storage: StorageConfig {
            backend: StorageBackend::Json,
            path: "./data/launches".into(),
        },
        monitoring: MonitoringConfig {
            log_level: "debug".to_string(),
            structured_logging: false,
        },
        ..OrchestratorConfig::default()
    };

    example.save(path)
}
