//! Token launchpad command line
//!
//! Runs launches against the simulated collaborators, persisting records with
//! the configured storage backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use launchpad_orchestrator::{
    create_example_config, simulated_collaborators, InMemoryLaunchRepository, JsonFileLaunchRepository,
    LaunchOrchestrator, LaunchRepository, OrchestratorConfig, StorageBackend,
};
use launchpad_types::{LaunchRecord, LaunchRequest, LaunchTier, LogoAsset};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Mint a token and seed its liquidity pool in one action")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "launchpad.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Simulated collaborator latency in milliseconds
    #[arg(long, default_value = "0")]
    latency_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a new token and drive it to completion
    Launch {
        #[arg(long)]
        name: String,

        #[arg(long)]
        symbol: String,

        /// Creator wallet address (base58)
        #[arg(long)]
        creator: String,

        /// basic or premium
        #[arg(long, default_value = "basic")]
        tier: LaunchTier,

        /// Logo image file
        #[arg(long)]
        logo: PathBuf,

        /// Initial price in quote tokens per token
        #[arg(long)]
        price: f64,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show a launch record
    Status { id: Uuid },

    /// Re-drive a failed launch from its last checkpoint
    Retry { id: Uuid },

    /// Continue an interrupted launch
    Resume { id: Uuid },

    /// Cancel a launch that has not minted yet
    Cancel { id: Uuid },

    /// List recent launches
    List {
        /// Only launches by this creator
        #[arg(long)]
        creator: Option<String>,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Write an example configuration file
    InitConfig {
        #[arg(short, long, default_value = "launchpad.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig { output } = &cli.command {
        create_example_config(output)?;
        println!("Wrote example configuration to {}", output.display());
        return Ok(());
    }

    let config_found = cli.config.exists();
    let mut config = if config_found {
        OrchestratorConfig::from_file(&cli.config)?
    } else {
        OrchestratorConfig::default()
    };

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config);
    if !config_found {
        warn!("Config file not found, using defaults: {}", cli.config.display());
    }
    config.validate()?;

    let repository = open_repository(&config).await?;
    let orchestrator = LaunchOrchestrator::new(
        config,
        repository,
        simulated_collaborators(Duration::from_millis(cli.latency_ms)),
    );

    match cli.command {
        Command::Launch {
            name,
            symbol,
            creator,
            tier,
            logo,
            price,
            description,
        } => {
            let request = LaunchRequest {
                name,
                symbol,
                description,
                creator_address: creator,
                tier,
                logo: read_logo(&logo)?,
                initial_price: price,
            };
            info!(fee_lamports = tier.config().launch_fee_lamports, "Launch fee for {} tier", tier);
            let record = orchestrator.launch(request).await?;
            print_record(&record)?;
        }
        Command::Status { id } => print_record(&orchestrator.get_launch_status(id).await?)?,
        Command::Retry { id } => print_record(&orchestrator.retry_launch(id).await?)?,
        Command::Resume { id } => print_record(&orchestrator.resume_launch(id).await?)?,
        Command::Cancel { id } => print_record(&orchestrator.cancel_launch(id).await?)?,
        Command::List { creator, limit } => {
            let records = match creator {
                Some(creator) => orchestrator.launches_by_creator(&creator, limit).await?,
                None => orchestrator.recent_launches(limit).await?,
            };
            for record in &records {
                println!(
                    "{}  {:<10}  {:<8}  {}",
                    record.id,
                    record.request.symbol,
                    record.request.tier,
                    record.state
                );
            }
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

async fn open_repository(config: &OrchestratorConfig) -> Result<Arc<dyn LaunchRepository>> {
    let repository: Arc<dyn LaunchRepository> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryLaunchRepository::new()),
        StorageBackend::Json => Arc::new(
            JsonFileLaunchRepository::open(&config.storage.path)
                .await
                .with_context(|| format!("opening launch store at {}", config.storage.path.display()))?,
        ),
    };
    Ok(repository)
}

fn read_logo(path: &Path) -> Result<LogoAsset> {
    let content_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => bail!("unsupported logo file type: {}", path.display()),
    };

    let bytes = std::fs::read(path).with_context(|| format!("reading logo {}", path.display()))?;
    Ok(LogoAsset {
        content_type: content_type.to_string(),
        bytes,
    })
}

fn print_record(record: &LaunchRecord) -> Result<()> {
    let summary = json!({
        "id": record.id,
        "name": record.request.name,
        "symbol": record.request.symbol,
        "tier": record.request.tier,
        "state": record.state.name(),
        "failure": record.failure(),
        "allocation": record.allocation,
        "active_bin": record.active_bin,
        "metadata": record.metadata,
        "mint": record.mint,
        "pool": record.pool,
        "liquidity": record.liquidity,
        "protection": record.protection,
        "links": record.trading_links(),
        "attempts": record.attempts.len(),
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_logging(config: &OrchestratorConfig) {
    let log_level = config
        .monitoring
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("launchpad={0},launchpad_orchestrator={0}", log_level).into()
    });

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
