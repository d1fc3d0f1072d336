//! Launch orchestrator
//!
//! Drives one launch through publish, mint, pool creation, liquidity seeding
//! and optional anti-sniper activation. Every collaborator call is recorded on
//! the launch record, and the record is saved before the next step begins, so
//! a failed or interrupted launch can be re-driven from its last checkpoint.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use launchpad_math::{allocate, build_curve_with, price_per_base_unit, price_to_bin};
use launchpad_types::{
    AttemptOutcome, Checkpoint, FailureCause, FailureKind, LaunchRecord, LaunchRequest,
    LaunchState, LaunchStep, LaunchpadResult, MetadataAttributes, ProtectionReceipt,
    ProvisionedPool, StateTransition, TokenAllocation,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collaborators::{Collaborators, CreatePoolRequest, MintError, MintRequest, ProvisionError, PublishError};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::lease::LaunchLeases;
use crate::repository::LaunchRepository;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// State change broadcast to subscribers
#[derive(Debug, Clone, Serialize)]
pub struct LaunchEvent {
    pub launch_id: Uuid,
    pub transition: StateTransition,
}

/// Result of driving a single step
enum StepOutcome {
    Reached,
    Failed(FailureCause),
}

/// Classified failure of one bounded collaborator call
enum CallFailure {
    Transient(String),
    Refused(FailureKind, String),
}

impl From<PublishError> for CallFailure {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Transient(_) => CallFailure::Transient(err.to_string()),
            PublishError::InvalidContent(_) => CallFailure::Refused(FailureKind::InvalidInput, err.to_string()),
            PublishError::Rejected(_) => CallFailure::Refused(FailureKind::Rejected, err.to_string()),
        }
    }
}

impl From<MintError> for CallFailure {
    fn from(err: MintError) -> Self {
        match err {
            MintError::Transient(_) => CallFailure::Transient(err.to_string()),
            MintError::Ambiguous { .. } => CallFailure::Refused(FailureKind::Ambiguous, err.to_string()),
            MintError::Rejected(_) => CallFailure::Refused(FailureKind::Rejected, err.to_string()),
        }
    }
}

impl From<ProvisionError> for CallFailure {
    fn from(err: ProvisionError) -> Self {
        if err.is_transient() {
            CallFailure::Transient(err.to_string())
        } else {
            CallFailure::Refused(FailureKind::Rejected, err.to_string())
        }
    }
}

/// What a reconciliation read established about an earlier write
enum Reconciliation {
    Applied,
    Absent,
    Unknown(FailureCause),
}

#[derive(Clone)]
pub struct LaunchOrchestrator {
    config: Arc<OrchestratorConfig>,
    repository: Arc<dyn LaunchRepository>,
    collaborators: Collaborators,
    leases: LaunchLeases,
    events: broadcast::Sender<LaunchEvent>,
}

impl LaunchOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        repository: Arc<dyn LaunchRepository>,
        collaborators: Collaborators,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            repository,
            collaborators,
            leases: LaunchLeases::new(),
            events,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ========================================================================
    // Public surface
    // ========================================================================

    /// Validate and persist a launch, then drive it on a background task.
    ///
    /// Returns as soon as the `Created` record is saved; poll
    /// `get_launch_status` or `subscribe` for progress.
    pub async fn start_launch(&self, request: LaunchRequest) -> OrchestratorResult<Uuid> {
        let record = self.prepare(request).await?;
        let id = record.id;
        if record.state.is_terminal() {
            return Ok(id);
        }

        let lease = self.leases.acquire(id)?;
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let _lease = lease;
            if let Err(e) = orchestrator.drive(record).await {
                error!(launch_id = %id, error = %e, "Background launch stopped");
            }
        });

        Ok(id)
    }

    /// Validate, persist and drive a launch to a terminal state inline
    pub async fn launch(&self, request: LaunchRequest) -> OrchestratorResult<LaunchRecord> {
        let record = self.prepare(request).await?;
        if record.state.is_terminal() {
            return Ok(record);
        }

        let _lease = self.leases.acquire(record.id)?;
        self.drive(record).await
    }

    pub async fn get_launch_status(&self, id: Uuid) -> OrchestratorResult<LaunchRecord> {
        self.load_record(id).await
    }

    /// Re-drive a failed launch from the checkpoint it failed at
    pub async fn retry_launch(&self, id: Uuid) -> OrchestratorResult<LaunchRecord> {
        let _lease = self.leases.acquire(id)?;
        let mut record = self.load_record(id).await?;

        let cause = match record.failure() {
            Some(cause) => cause.clone(),
            None => {
                return Err(OrchestratorError::NotRetryable {
                    id,
                    reason: format!("launch is {}, not failed", record.state.name()),
                })
            }
        };

        if !cause.kind.is_retryable() {
            return Err(OrchestratorError::NotRetryable {
                id,
                reason: format!("{:?} failures are final", cause.kind),
            });
        }

        let at = record.checkpoint();
        info!(launch_id = %id, checkpoint = ?at, previous_error = %cause.message, "Retrying failed launch");
        self.transition(&mut record, LaunchState::from(at)).await?;

        self.drive(record).await
    }

    /// Continue a non-terminal launch nobody is driving, e.g. after a restart
    pub async fn resume_launch(&self, id: Uuid) -> OrchestratorResult<LaunchRecord> {
        let _lease = self.leases.acquire(id)?;
        let record = self.load_record(id).await?;

        if record.state.is_terminal() {
            return Err(OrchestratorError::NotRetryable {
                id,
                reason: format!("launch is already {}", record.state.name()),
            });
        }

        info!(launch_id = %id, state = record.state.name(), "Resuming launch");
        self.drive(record).await
    }

    /// Cancel a launch that has not minted yet.
    ///
    /// An idle launch is failed immediately and the failed record returned.
    /// A launch being driven stops before its next step; the record returned
    /// is the one persisted at the time of the request.
    pub async fn cancel_launch(&self, id: Uuid) -> OrchestratorResult<LaunchRecord> {
        let record = self.load_record(id).await?;
        ensure_cancellable(&record)?;

        loop {
            match self.leases.acquire(id) {
                Ok(_lease) => {
                    let mut record = self.load_record(id).await?;
                    ensure_cancellable(&record)?;

                    let step = record.checkpoint().next_step(record.tier_config.anti_sniper);
                    self.fail_launch(
                        &mut record,
                        FailureCause::new(step, FailureKind::Cancelled, "cancelled by request"),
                    )
                    .await?;
                    return Ok(record);
                }
                Err(OrchestratorError::LaunchBusy(_)) => {
                    if self.leases.request_cancel(id)? {
                        info!(launch_id = %id, "Cancellation requested for running launch");
                        return Ok(record);
                    }
                    // The driver let go in between; cancel directly
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LaunchEvent> {
        self.events.subscribe()
    }

    pub async fn recent_launches(&self, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        self.repository.list_recent(limit).await
    }

    pub async fn launches_by_creator(&self, creator: &str, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        self.repository.list_by_creator(creator, limit).await
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    async fn prepare(&self, request: LaunchRequest) -> OrchestratorResult<LaunchRecord> {
        request.validate()?;
        self.config.logo.check(&request.logo)?;
        self.config.check_initial_price(request.initial_price)?;

        // Held until the new record is saved
        let _symbol = self.leases.reserve_symbol(&request.symbol)?;
        self.ensure_symbol_available(&request.symbol).await?;

        let tier_config = request.tier.config();
        let mut record = LaunchRecord::new(
            Uuid::new_v4(),
            request,
            tier_config,
            self.config.curve_params(),
            &self.config.pool.quote_mint,
        );

        info!(
            launch_id = %record.id,
            symbol = %record.request.symbol,
            tier = record.request.tier.as_str(),
            "Launch created"
        );

        match self.plan(&record) {
            Ok((allocation, active_bin)) => {
                debug!(
                    launch_id = %record.id,
                    creator_amount = allocation.creator_amount,
                    liquidity_amount = allocation.liquidity_amount,
                    active_bin,
                    "Launch planned"
                );
                record.allocation = Some(allocation);
                record.active_bin = Some(active_bin);
                self.repository.save(&record).await?;
            }
            Err(e) => {
                warn!(launch_id = %record.id, error = %e, "Launch inputs rejected by calculators");
                self.fail_launch(&mut record, FailureCause::new(None, FailureKind::InvalidInput, e.to_string()))
                    .await?;
            }
        }

        Ok(record)
    }

    /// Pre-flight every calculator before the first external write
    fn plan(&self, record: &LaunchRecord) -> LaunchpadResult<(TokenAllocation, i32)> {
        let token = &self.config.token;
        let allocation = allocate(token.supply, token.decimals, token.creator_share_bps)?;

        let unit_price = price_per_base_unit(
            record.request.initial_price,
            token.decimals,
            self.config.pool.quote_decimals,
        );
        let active_bin = price_to_bin(unit_price, record.tier_config.bin_step_bps)?;

        build_curve_with(active_bin, &record.curve, allocation.liquidity_amount)?;

        Ok((allocation, active_bin))
    }

    async fn ensure_symbol_available(&self, symbol: &str) -> OrchestratorResult<()> {
        let taken = self
            .repository
            .find_by_symbol(symbol)
            .await?
            .iter()
            .any(|existing| {
                !existing.state.is_failed() || existing.mint.is_some() || existing.unconfirmed_mint.is_some()
            });

        if taken {
            return Err(OrchestratorError::SymbolTaken(symbol.to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Driver
    // ========================================================================

    /// Drive `record` to a terminal state. The caller must hold its lease.
    async fn drive(&self, mut record: LaunchRecord) -> OrchestratorResult<LaunchRecord> {
        let result = self.drive_steps(&mut record).await;

        match result {
            Ok(()) => Ok(record),
            Err(e) => {
                error!(launch_id = %record.id, error = %e, "Launch driver aborted");
                if !record.state.is_terminal() {
                    let step = record.checkpoint().next_step(record.tier_config.anti_sniper);
                    let transition = record.fail(FailureCause::new(step, FailureKind::Storage, e.to_string()));
                    match self.repository.save(&record).await {
                        Ok(()) => self.announce(record.id, transition),
                        Err(save_err) => {
                            warn!(launch_id = %record.id, error = %save_err, "Could not persist storage failure")
                        }
                    }
                }
                Err(e)
            }
        }
    }

    async fn drive_steps(&self, record: &mut LaunchRecord) -> OrchestratorResult<()> {
        let anti_sniper = record.tier_config.anti_sniper;

        while !record.state.is_terminal() {
            let checkpoint = record.checkpoint();
            let step = match checkpoint.next_step(anti_sniper) {
                Some(step) => step,
                None => {
                    self.transition(record, LaunchState::Completed).await?;
                    info!(
                        launch_id = %record.id,
                        mint = record.mint_address().unwrap_or_default(),
                        pool = record.pool_address().unwrap_or_default(),
                        "Launch completed"
                    );
                    break;
                }
            };

            if self.leases.take_cancel_request(record.id) {
                if checkpoint.is_cancellable() {
                    self.fail_launch(
                        record,
                        FailureCause::new(Some(step), FailureKind::Cancelled, "cancelled by request"),
                    )
                    .await?;
                    break;
                }
                warn!(launch_id = %record.id, checkpoint = ?checkpoint, "Ignoring cancellation after mint");
            }

            debug!(launch_id = %record.id, step = %step, "Starting step");
            let outcome = match step {
                LaunchStep::PublishMetadata => self.publish_metadata(record).await?,
                LaunchStep::MintToken => self.mint_token(record).await?,
                LaunchStep::CreatePool => self.create_pool(record).await?,
                LaunchStep::SeedLiquidity => self.seed_liquidity(record).await?,
                LaunchStep::ActivateProtection => self.activate_protection(record).await?,
            };

            match outcome {
                StepOutcome::Reached => self.transition(record, step.reached().into()).await?,
                StepOutcome::Failed(cause) => self.fail_launch(record, cause).await?,
            }
        }

        Ok(())
    }

    // ========================================================================
    // Steps
    // ========================================================================

    async fn publish_metadata(&self, record: &mut LaunchRecord) -> OrchestratorResult<StepOutcome> {
        let step = LaunchStep::PublishMetadata;
        let allocation = planned_allocation(record)?;
        let request = &record.request;
        let attributes = MetadataAttributes::new(
            &request.name,
            &request.symbol,
            request.description.as_deref(),
            self.config.token.supply,
            allocation.decimals,
            request.tier,
            &request.creator_address,
        );
        let logo = request.logo.clone();

        let mut attempt = 0;
        let published = loop {
            attempt += 1;
            let result = self
                .bounded(self.collaborators.publisher.publish(&logo.bytes, &logo.content_type, &attributes))
                .await;
            match result {
                Ok(published) => break published,
                Err(failure) => {
                    if let Some(cause) = self.settle_failure(record, step, attempt, failure).await? {
                        return Ok(StepOutcome::Failed(cause));
                    }
                }
            }
        };

        info!(launch_id = %record.id, locator = %published.locator, attempt, "Metadata published");
        record.record_attempt(step, attempt, AttemptOutcome::Succeeded);
        record.metadata = Some(published);
        Ok(StepOutcome::Reached)
    }

    async fn mint_token(&self, record: &mut LaunchRecord) -> OrchestratorResult<StepOutcome> {
        let step = LaunchStep::MintToken;

        // A submission that may have landed must be settled before anything is resubmitted
        if let Some(address) = record.unconfirmed_mint.clone() {
            match self.reconcile_mint(record, &address, 0).await? {
                Reconciliation::Applied => return Ok(StepOutcome::Reached),
                Reconciliation::Absent => {}
                Reconciliation::Unknown(cause) => return Ok(StepOutcome::Failed(cause)),
            }
        }

        let allocation = planned_allocation(record)?;
        let metadata = record
            .metadata
            .as_ref()
            .ok_or_else(|| missing(record, "published metadata"))?;
        let mut request = MintRequest {
            mint_address: String::new(),
            name: record.request.name.clone(),
            symbol: record.request.symbol.clone(),
            metadata_locator: metadata.locator.clone(),
            creator_address: record.request.creator_address.clone(),
            creator_amount: allocation.creator_amount,
            liquidity_amount: allocation.liquidity_amount,
            decimals: allocation.decimals,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let reserved = self
                .bounded(self.collaborators.minter.reserve_mint_address(&request))
                .await;
            request.mint_address = match reserved {
                Ok(address) => address,
                Err(failure) => {
                    if let Some(cause) = self.settle_failure(record, step, attempt, failure).await? {
                        return Ok(StepOutcome::Failed(cause));
                    }
                    continue;
                }
            };

            // Persisted before submitting so a crash mid-call is reconciled, not reminted
            record.unconfirmed_mint = Some(request.mint_address.clone());
            self.repository.save(record).await?;

            // Not bounded by the call timeout: an abandoned submission can still land later
            let result = self.collaborators.minter.mint(&request).await;
            match result {
                Ok(minted) => {
                    info!(launch_id = %record.id, mint = %minted.mint_address, attempt, "Token minted");
                    record.record_attempt(step, attempt, AttemptOutcome::Succeeded);
                    record.mint = Some(minted);
                    record.unconfirmed_mint = None;
                    return Ok(StepOutcome::Reached);
                }
                Err(MintError::Ambiguous { mint_address, reason }) => {
                    warn!(launch_id = %record.id, mint = %mint_address, attempt, reason = %reason, "Mint outcome unknown");
                    record.record_attempt(step, attempt, AttemptOutcome::Ambiguous(reason.clone()));
                    record.unconfirmed_mint = Some(mint_address.clone());
                    self.repository.save(record).await?;

                    match self.reconcile_mint(record, &mint_address, attempt).await? {
                        Reconciliation::Applied => return Ok(StepOutcome::Reached),
                        Reconciliation::Absent => {
                            if let Some(cause) = self.pause_before_retry(record, step, attempt, &reason).await {
                                return Ok(StepOutcome::Failed(cause));
                            }
                        }
                        Reconciliation::Unknown(cause) => return Ok(StepOutcome::Failed(cause)),
                    }
                }
                Err(e) if e.is_transient() => {
                    record.unconfirmed_mint = None;
                    if let Some(cause) = self.after_transient(record, step, attempt, e.to_string()).await? {
                        return Ok(StepOutcome::Failed(cause));
                    }
                }
                Err(e) => {
                    record.unconfirmed_mint = None;
                    let cause = self
                        .refuse(record, step, attempt, FailureKind::Rejected, e.to_string())
                        .await;
                    return Ok(StepOutcome::Failed(cause));
                }
            }
        }
    }

    async fn create_pool(&self, record: &mut LaunchRecord) -> OrchestratorResult<StepOutcome> {
        let step = LaunchStep::CreatePool;
        let base_mint = record
            .mint_address()
            .ok_or_else(|| missing(record, "mint address"))?
            .to_string();
        let active_bin = planned_active_bin(record)?;
        let tier = &record.tier_config;
        let request = CreatePoolRequest {
            base_mint,
            quote_mint: record.quote_mint.clone(),
            bin_step_bps: tier.bin_step_bps,
            base_fee_bps: tier.base_fee_bps,
            active_bin,
            activation_delay_secs: tier.activation_delay_secs,
        };

        let mut attempt = 0;
        let created = loop {
            attempt += 1;
            let result = self.bounded(self.collaborators.provisioner.create_pool(&request)).await;
            match result {
                Ok(created) => break created,
                Err(failure) => {
                    if let Some(cause) = self.settle_failure(record, step, attempt, failure).await? {
                        return Ok(StepOutcome::Failed(cause));
                    }
                }
            }
        };

        info!(launch_id = %record.id, pool = %created.pool_address, active_bin, attempt, "Pool created");
        record.record_attempt(step, attempt, AttemptOutcome::Succeeded);
        record.pool = Some(ProvisionedPool {
            pool_address: created.pool_address,
            base_mint: request.base_mint,
            quote_mint: request.quote_mint,
            bin_step_bps: request.bin_step_bps,
            base_fee_bps: request.base_fee_bps,
            active_bin,
        });
        Ok(StepOutcome::Reached)
    }

    async fn seed_liquidity(&self, record: &mut LaunchRecord) -> OrchestratorResult<StepOutcome> {
        let step = LaunchStep::SeedLiquidity;
        let pool_address = record
            .pool_address()
            .ok_or_else(|| missing(record, "pool address"))?
            .to_string();

        // A deposit submitted before a crash or timeout may already have landed
        if record.liquidity_pending {
            match self.reconcile_liquidity(record, &pool_address, 0).await? {
                Reconciliation::Applied => return Ok(StepOutcome::Reached),
                Reconciliation::Absent => {}
                Reconciliation::Unknown(cause) => return Ok(StepOutcome::Failed(cause)),
            }
        }

        let allocation = planned_allocation(record)?;
        let active_bin = planned_active_bin(record)?;
        let distribution = match build_curve_with(active_bin, &record.curve, allocation.liquidity_amount) {
            Ok(distribution) => distribution,
            Err(e) => {
                return Ok(StepOutcome::Failed(FailureCause::new(
                    Some(step),
                    FailureKind::InvalidInput,
                    e.to_string(),
                )))
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            record.liquidity_pending = true;
            self.repository.save(record).await?;

            let result = self
                .bounded(self.collaborators.provisioner.seed_liquidity(&pool_address, &distribution))
                .await;
            match result {
                Ok(receipt) => {
                    info!(
                        launch_id = %record.id,
                        pool = %pool_address,
                        bins = distribution.len(),
                        total = distribution.total_amount(),
                        attempt,
                        "Liquidity seeded"
                    );
                    record.record_attempt(step, attempt, AttemptOutcome::Succeeded);
                    record.liquidity = Some(receipt);
                    record.liquidity_pending = false;
                    return Ok(StepOutcome::Reached);
                }
                Err(CallFailure::Transient(reason)) => {
                    record.record_attempt(step, attempt, AttemptOutcome::Transient(reason.clone()));
                    match self.reconcile_liquidity(record, &pool_address, attempt).await? {
                        Reconciliation::Applied => return Ok(StepOutcome::Reached),
                        Reconciliation::Absent => {
                            if let Some(cause) = self.pause_before_retry(record, step, attempt, &reason).await {
                                return Ok(StepOutcome::Failed(cause));
                            }
                        }
                        Reconciliation::Unknown(cause) => return Ok(StepOutcome::Failed(cause)),
                    }
                }
                Err(CallFailure::Refused(kind, reason)) => {
                    record.liquidity_pending = false;
                    let cause = self.refuse(record, step, attempt, kind, reason).await;
                    return Ok(StepOutcome::Failed(cause));
                }
            }
        }
    }

    async fn activate_protection(&self, record: &mut LaunchRecord) -> OrchestratorResult<StepOutcome> {
        let step = LaunchStep::ActivateProtection;
        let pool_address = record
            .pool_address()
            .ok_or_else(|| missing(record, "pool address"))?
            .to_string();
        let allocation = planned_allocation(record)?;
        let delay_secs = record.tier_config.activation_delay_secs;
        let max_buy_per_tx = match allocation.to_base_units(record.tier_config.max_buy_per_tx_tokens) {
            Ok(amount) => amount,
            Err(e) => {
                return Ok(StepOutcome::Failed(FailureCause::new(
                    Some(step),
                    FailureKind::InvalidInput,
                    e.to_string(),
                )))
            }
        };

        let mut attempt = 0;
        let activated = loop {
            attempt += 1;
            let result = self
                .bounded(
                    self.collaborators
                        .provisioner
                        .activate_protection(&pool_address, delay_secs, max_buy_per_tx),
                )
                .await;
            match result {
                Ok(activated) => break activated,
                Err(failure) => {
                    if let Some(cause) = self.settle_failure(record, step, attempt, failure).await? {
                        return Ok(StepOutcome::Failed(cause));
                    }
                }
            }
        };

        let activates_at = Utc::now() + chrono::Duration::seconds(delay_secs as i64);
        info!(launch_id = %record.id, delay_secs, max_buy_per_tx, %activates_at, "Anti-sniper protection active");
        record.record_attempt(step, attempt, AttemptOutcome::Succeeded);
        record.protection = Some(ProtectionReceipt {
            receipt: activated.receipt,
            delay_secs,
            max_buy_per_tx,
            activates_at,
        });
        Ok(StepOutcome::Reached)
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    async fn reconcile_mint(
        &self,
        record: &mut LaunchRecord,
        mint_address: &str,
        attempt: u32,
    ) -> OrchestratorResult<Reconciliation> {
        let step = LaunchStep::MintToken;

        let result = self.bounded(self.collaborators.minter.find_mint(mint_address)).await;
        match result {
            Ok(Some(minted)) => {
                info!(launch_id = %record.id, mint = %mint_address, "Ambiguous mint confirmed on ledger");
                record.record_attempt(step, attempt, AttemptOutcome::Reconciled);
                record.mint = Some(minted);
                record.unconfirmed_mint = None;
                Ok(Reconciliation::Applied)
            }
            Ok(None) => {
                info!(launch_id = %record.id, mint = %mint_address, "Ambiguous mint not found, safe to resubmit");
                record.unconfirmed_mint = None;
                self.repository.save(record).await?;
                Ok(Reconciliation::Absent)
            }
            Err(CallFailure::Transient(reason) | CallFailure::Refused(_, reason)) => {
                warn!(launch_id = %record.id, mint = %mint_address, error = %reason, "Mint reconciliation failed");
                Ok(Reconciliation::Unknown(FailureCause::new(
                    Some(step),
                    FailureKind::Ambiguous,
                    format!("mint {} could not be confirmed: {}", mint_address, reason),
                )))
            }
        }
    }

    async fn reconcile_liquidity(
        &self,
        record: &mut LaunchRecord,
        pool_address: &str,
        attempt: u32,
    ) -> OrchestratorResult<Reconciliation> {
        let step = LaunchStep::SeedLiquidity;

        let result = self
            .bounded(self.collaborators.provisioner.find_liquidity(pool_address))
            .await;
        match result {
            Ok(Some(receipt)) => {
                info!(launch_id = %record.id, pool = %pool_address, "Earlier liquidity deposit found");
                record.record_attempt(step, attempt, AttemptOutcome::Reconciled);
                record.liquidity = Some(receipt);
                record.liquidity_pending = false;
                Ok(Reconciliation::Applied)
            }
            Ok(None) => {
                record.liquidity_pending = false;
                self.repository.save(record).await?;
                Ok(Reconciliation::Absent)
            }
            Err(CallFailure::Transient(reason) | CallFailure::Refused(_, reason)) => {
                warn!(launch_id = %record.id, pool = %pool_address, error = %reason, "Liquidity reconciliation failed");
                Ok(Reconciliation::Unknown(FailureCause::new(
                    Some(step),
                    FailureKind::Ambiguous,
                    format!("liquidity deposit on {} could not be confirmed: {}", pool_address, reason),
                )))
            }
        }
    }

    // ========================================================================
    // Attempt bookkeeping
    // ========================================================================

    /// Run one publish or provisioning call under the configured timeout
    async fn bounded<T, E, F>(&self, call: F) -> Result<T, CallFailure>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<CallFailure>,
    {
        match tokio::time::timeout(self.config.call_timeout(), call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(CallFailure::Transient(format!(
                "timed out after {} ms",
                self.config.collaborators.call_timeout_ms
            ))),
        }
    }

    /// Record a failed attempt; `Some` ends the step
    async fn settle_failure(
        &self,
        record: &mut LaunchRecord,
        step: LaunchStep,
        attempt: u32,
        failure: CallFailure,
    ) -> OrchestratorResult<Option<FailureCause>> {
        match failure {
            CallFailure::Transient(reason) => self.after_transient(record, step, attempt, reason).await,
            CallFailure::Refused(kind, reason) => Ok(Some(self.refuse(record, step, attempt, kind, reason).await)),
        }
    }

    async fn after_transient(
        &self,
        record: &mut LaunchRecord,
        step: LaunchStep,
        attempt: u32,
        reason: String,
    ) -> OrchestratorResult<Option<FailureCause>> {
        record.record_attempt(step, attempt, AttemptOutcome::Transient(reason.clone()));
        self.repository.save(record).await?;
        Ok(self.pause_before_retry(record, step, attempt, &reason).await)
    }

    /// Back off before the next attempt, or give up once the budget is spent
    async fn pause_before_retry(
        &self,
        record: &LaunchRecord,
        step: LaunchStep,
        attempt: u32,
        reason: &str,
    ) -> Option<FailureCause> {
        let retry = &self.config.retry;
        if attempt >= retry.max_attempts() {
            error!(launch_id = %record.id, step = %step, attempt, error = %reason, "Retries exhausted");
            return Some(FailureCause::new(
                Some(step),
                FailureKind::RetriesExhausted,
                format!("gave up after {} attempts: {}", attempt, reason),
            ));
        }

        let delay = retry.delay_for_attempt(attempt - 1);
        warn!(
            launch_id = %record.id,
            step = %step,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %reason,
            "Transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        None
    }

    async fn refuse(
        &self,
        record: &mut LaunchRecord,
        step: LaunchStep,
        attempt: u32,
        kind: FailureKind,
        reason: String,
    ) -> FailureCause {
        error!(launch_id = %record.id, step = %step, attempt, kind = ?kind, error = %reason, "Step refused");
        record.record_attempt(step, attempt, AttemptOutcome::Rejected(reason.clone()));
        FailureCause::new(Some(step), kind, reason)
    }

    // ========================================================================
    // State persistence
    // ========================================================================

    async fn transition(&self, record: &mut LaunchRecord, to: LaunchState) -> OrchestratorResult<()> {
        let transition = record.transition_to(to);
        self.repository.save(record).await?;
        self.announce(record.id, transition);
        Ok(())
    }

    async fn fail_launch(&self, record: &mut LaunchRecord, cause: FailureCause) -> OrchestratorResult<()> {
        let transition = record.fail(cause);
        self.repository.save(record).await?;
        self.announce(record.id, transition);
        Ok(())
    }

    fn announce(&self, launch_id: Uuid, transition: StateTransition) {
        info!(
            launch_id = %launch_id,
            from = transition.from.name(),
            to = transition.to.name(),
            "Launch state changed"
        );
        if let LaunchState::Failed { at, cause } = &transition.to {
            warn!(launch_id = %launch_id, at = ?at, kind = ?cause.kind, error = %cause.message, "Launch failed");
        }

        // No subscribers is fine
        let _ = self.events.send(LaunchEvent { launch_id, transition });
    }

    async fn load_record(&self, id: Uuid) -> OrchestratorResult<LaunchRecord> {
        self.repository
            .load(id)
            .await?
            .ok_or(OrchestratorError::LaunchNotFound(id))
    }
}

fn ensure_cancellable(record: &LaunchRecord) -> OrchestratorResult<()> {
    let at = record.state.checkpoint();
    if at.map_or(false, |checkpoint: Checkpoint| checkpoint.is_cancellable()) {
        Ok(())
    } else {
        Err(OrchestratorError::NotCancellable { id: record.id, at })
    }
}

fn planned_allocation(record: &LaunchRecord) -> OrchestratorResult<TokenAllocation> {
    record.allocation.ok_or_else(|| missing(record, "planned allocation"))
}

fn planned_active_bin(record: &LaunchRecord) -> OrchestratorResult<i32> {
    record.active_bin.ok_or_else(|| missing(record, "planned active bin"))
}

fn missing(record: &LaunchRecord, what: &str) -> OrchestratorError {
    OrchestratorError::Storage(format!(
        "launch {} at {} has no {}",
        record.id,
        record.state.name(),
        what
    ))
}
