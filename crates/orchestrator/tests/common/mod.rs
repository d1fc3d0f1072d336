//! Scripted collaborators that count every call

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use launchpad_orchestrator::{
    Collaborators, CreatePoolRequest, CreatedPool, InMemoryLaunchRepository, LaunchOrchestrator,
    MetadataPublisher, MintError, MintRequest, OrchestratorConfig, PoolProvisioner, ProtectionActivated,
    ProvisionError, PublishError, StorageBackend, TokenMinter,
};
use launchpad_types::{
    BinDistribution, LaunchRecord, LaunchRequest, LaunchTier, LiquidityReceipt, LogoAsset,
    MetadataAttributes, MintedToken, PublishedMetadata,
};
use tokio::sync::Notify;
use uuid::Uuid;

pub const CREATOR: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const MINT_ADDRESS: &str = "MintXq8sYh4K7uVgFq3N5vZ1c9bT2wLrD6pJmEoA1234";
pub const POOL_ADDRESS: &str = "PoolDLMM7hQ3kzY2xW9vT5nR8mC4bJ6pL1aSdFgH5678";

/// Consume one pending stall, if any
fn take_stall(stalls: &AtomicUsize) -> bool {
    stalls
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn pop<T>(script: &Mutex<VecDeque<T>>) -> Option<T> {
    script.lock().unwrap().pop_front()
}

pub fn minted() -> MintedToken {
    MintedToken {
        mint_address: MINT_ADDRESS.to_string(),
        mint_receipt: "mint-signature".to_string(),
    }
}

// ============================================================================
// Publisher
// ============================================================================

#[derive(Default)]
pub struct ScriptedPublisher {
    pub script: Mutex<VecDeque<Result<PublishedMetadata, PublishError>>>,
    pub calls: AtomicUsize,
    /// When set, every publish waits for `release` before answering
    pub blocking: bool,
    pub release: Notify,
}

impl ScriptedPublisher {
    pub fn push(&self, outcome: Result<PublishedMetadata, PublishError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataPublisher for ScriptedPublisher {
    async fn publish(
        &self,
        _bytes: &[u8],
        _content_type: &str,
        attributes: &MetadataAttributes,
    ) -> Result<PublishedMetadata, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.blocking {
            self.release.notified().await;
        }

        pop(&self.script).unwrap_or_else(|| {
            Ok(PublishedMetadata {
                locator: format!("ipfs://{}", attributes.symbol),
                content_hash: "00".repeat(32),
            })
        })
    }
}

// ============================================================================
// Minter
// ============================================================================

#[derive(Default)]
pub struct ScriptedMinter {
    pub mint_script: Mutex<VecDeque<Result<MintedToken, MintError>>>,
    pub find_script: Mutex<VecDeque<Result<Option<MintedToken>, MintError>>>,
    /// Number of upcoming mint calls that never answer
    pub mint_stalls: AtomicUsize,
    /// Number of upcoming find_mint calls that never answer
    pub find_stalls: AtomicUsize,
    pub mint_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub requests: Mutex<Vec<MintRequest>>,
}

impl ScriptedMinter {
    pub fn push_mint(&self, outcome: Result<MintedToken, MintError>) {
        self.mint_script.lock().unwrap().push_back(outcome);
    }

    pub fn push_find(&self, outcome: Result<Option<MintedToken>, MintError>) {
        self.find_script.lock().unwrap().push_back(outcome);
    }

    pub fn mint_calls(&self) -> usize {
        self.mint_calls.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMinter for ScriptedMinter {
    async fn reserve_mint_address(&self, _request: &MintRequest) -> Result<String, MintError> {
        Ok(MINT_ADDRESS.to_string())
    }

    async fn mint(&self, request: &MintRequest) -> Result<MintedToken, MintError> {
        self.mint_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if take_stall(&self.mint_stalls) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        pop(&self.mint_script).unwrap_or_else(|| Ok(minted()))
    }

    async fn find_mint(&self, _mint_address: &str) -> Result<Option<MintedToken>, MintError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if take_stall(&self.find_stalls) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        pop(&self.find_script).unwrap_or(Ok(None))
    }
}

// ============================================================================
// Provisioner
// ============================================================================

#[derive(Default)]
pub struct ScriptedProvisioner {
    pub create_script: Mutex<VecDeque<Result<CreatedPool, ProvisionError>>>,
    pub seed_script: Mutex<VecDeque<Result<LiquidityReceipt, ProvisionError>>>,
    pub find_script: Mutex<VecDeque<Result<Option<LiquidityReceipt>, ProvisionError>>>,
    pub protect_script: Mutex<VecDeque<Result<ProtectionActivated, ProvisionError>>>,
    /// Number of upcoming create_pool calls that never answer
    pub create_stalls: AtomicUsize,

    pub create_calls: AtomicUsize,
    pub seed_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub protect_calls: AtomicUsize,

    pub create_requests: Mutex<Vec<CreatePoolRequest>>,
    pub distributions: Mutex<Vec<BinDistribution>>,
    pub protections: Mutex<Vec<(u64, u64)>>,
}

impl ScriptedProvisioner {
    pub fn push_create(&self, outcome: Result<CreatedPool, ProvisionError>) {
        self.create_script.lock().unwrap().push_back(outcome);
    }

    pub fn push_seed(&self, outcome: Result<LiquidityReceipt, ProvisionError>) {
        self.seed_script.lock().unwrap().push_back(outcome);
    }

    pub fn push_find(&self, outcome: Result<Option<LiquidityReceipt>, ProvisionError>) {
        self.find_script.lock().unwrap().push_back(outcome);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn seed_calls(&self) -> usize {
        self.seed_calls.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn protect_calls(&self) -> usize {
        self.protect_calls.load(Ordering::SeqCst)
    }
}

pub fn deposit_receipt(distribution_len: usize, total: u64) -> LiquidityReceipt {
    LiquidityReceipt {
        receipt: "deposit-signature".to_string(),
        bin_count: distribution_len,
        total_amount: total,
    }
}

#[async_trait]
impl PoolProvisioner for ScriptedProvisioner {
    async fn create_pool(&self, request: &CreatePoolRequest) -> Result<CreatedPool, ProvisionError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_requests.lock().unwrap().push(request.clone());

        if take_stall(&self.create_stalls) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        pop(&self.create_script).unwrap_or_else(|| {
            Ok(CreatedPool {
                pool_address: POOL_ADDRESS.to_string(),
            })
        })
    }

    async fn seed_liquidity(
        &self,
        _pool_address: &str,
        distribution: &BinDistribution,
    ) -> Result<LiquidityReceipt, ProvisionError> {
        self.seed_calls.fetch_add(1, Ordering::SeqCst);
        self.distributions.lock().unwrap().push(distribution.clone());
        pop(&self.seed_script)
            .unwrap_or_else(|| Ok(deposit_receipt(distribution.len(), distribution.total_amount())))
    }

    async fn find_liquidity(&self, _pool_address: &str) -> Result<Option<LiquidityReceipt>, ProvisionError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.find_script).unwrap_or(Ok(None))
    }

    async fn activate_protection(
        &self,
        _pool_address: &str,
        delay_secs: u64,
        max_buy_per_tx: u64,
    ) -> Result<ProtectionActivated, ProvisionError> {
        self.protect_calls.fetch_add(1, Ordering::SeqCst);
        self.protections.lock().unwrap().push((delay_secs, max_buy_per_tx));
        pop(&self.protect_script).unwrap_or_else(|| {
            Ok(ProtectionActivated {
                receipt: "vault-signature".to_string(),
            })
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Defaults with millisecond backoff so retry scenarios run quickly
pub fn fast_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.collaborators.call_timeout_ms = 1_000;
    config.storage.backend = StorageBackend::Memory;
    config
}

pub fn request(symbol: &str, tier: LaunchTier) -> LaunchRequest {
    LaunchRequest {
        name: format!("{} Token", symbol),
        symbol: symbol.to_string(),
        description: None,
        creator_address: CREATOR.to_string(),
        tier,
        logo: LogoAsset {
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a],
        },
        initial_price: 0.0001,
    }
}

pub struct Harness {
    pub orchestrator: LaunchOrchestrator,
    pub repository: Arc<InMemoryLaunchRepository>,
    pub publisher: Arc<ScriptedPublisher>,
    pub minter: Arc<ScriptedMinter>,
    pub provisioner: Arc<ScriptedProvisioner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(fast_config(), ScriptedPublisher::default())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self::build(config, ScriptedPublisher::default())
    }

    /// Publisher calls wait for `publisher.release`
    pub fn blocking_publisher() -> Self {
        Self::build(
            fast_config(),
            ScriptedPublisher {
                blocking: true,
                ..ScriptedPublisher::default()
            },
        )
    }

    /// A fresh orchestrator over the same store and collaborators, as after a restart
    pub fn restart(&self) -> LaunchOrchestrator {
        LaunchOrchestrator::new(
            self.orchestrator.config().clone(),
            self.repository.clone(),
            Collaborators {
                publisher: self.publisher.clone(),
                minter: self.minter.clone(),
                provisioner: self.provisioner.clone(),
            },
        )
    }

    fn build(config: OrchestratorConfig, publisher: ScriptedPublisher) -> Self {
        let repository = Arc::new(InMemoryLaunchRepository::new());
        let publisher = Arc::new(publisher);
        let minter = Arc::new(ScriptedMinter::default());
        let provisioner = Arc::new(ScriptedProvisioner::default());

        let orchestrator = LaunchOrchestrator::new(
            config,
            repository.clone(),
            Collaborators {
                publisher: publisher.clone(),
                minter: minter.clone(),
                provisioner: provisioner.clone(),
            },
        );

        Self {
            orchestrator,
            repository,
            publisher,
            minter,
            provisioner,
        }
    }

    /// Poll until the launch is terminal
    pub async fn wait_terminal(&self, id: Uuid) -> LaunchRecord {
        for _ in 0..500 {
            let record = self.orchestrator.get_launch_status(id).await.unwrap();
            if record.state.is_terminal() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("launch {} did not finish", id);
    }

    /// Poll until the publisher has been called `n` times
    pub async fn wait_publish_calls(&self, n: usize) {
        for _ in 0..500 {
            if self.publisher.calls() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("publisher was not called {} times", n);
    }
}
