//! Token launch orchestration
//!
//! Publishes token metadata, mints the token, creates its bin-based liquidity
//! pool, seeds the pool along a decaying curve around the initial price and,
//! for premium launches, activates the anti-sniper window. Progress is
//! persisted after every step so failed launches can be retried from their
//! last checkpoint.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod lease;
pub mod orchestrator;
pub mod repository;
pub mod simulated;

pub use collaborators::*;
pub use config::{create_example_config, OrchestratorConfig, RetryConfig, StorageBackend};
pub use error::{OrchestratorError, OrchestratorResult};
pub use lease::{LaunchLeases, LeaseGuard};
pub use orchestrator::{LaunchEvent, LaunchOrchestrator};
pub use repository::{InMemoryLaunchRepository, JsonFileLaunchRepository, LaunchRepository};
pub use simulated::{
    simulated_collaborators, SimulatedMetadataPublisher, SimulatedPoolProvisioner, SimulatedTokenMinter,
};
