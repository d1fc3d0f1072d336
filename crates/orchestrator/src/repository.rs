//! Launch record persistence

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use launchpad_types::LaunchRecord;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Storage port for launch records
#[async_trait]
pub trait LaunchRepository: Send + Sync {
    /// Insert or overwrite a record
    async fn save(&self, record: &LaunchRecord) -> OrchestratorResult<()>;

    async fn load(&self, id: Uuid) -> OrchestratorResult<Option<LaunchRecord>>;

    /// All records for a symbol, newest first
    async fn find_by_symbol(&self, symbol: &str) -> OrchestratorResult<Vec<LaunchRecord>>;

    /// Most recently created records, newest first
    async fn list_recent(&self, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>>;

    async fn list_by_creator(&self, creator: &str, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>>;
}

fn newest_first(mut records: Vec<LaunchRecord>, limit: usize) -> Vec<LaunchRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(limit);
    records
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local repository, for tests and single-shot runs
#[derive(Default)]
pub struct InMemoryLaunchRepository {
    records: RwLock<HashMap<Uuid, LaunchRecord>>,
}

impl InMemoryLaunchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LaunchRepository for InMemoryLaunchRepository {
    async fn save(&self, record: &LaunchRecord) -> OrchestratorResult<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> OrchestratorResult<Option<LaunchRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_symbol(&self, symbol: &str) -> OrchestratorResult<Vec<LaunchRecord>> {
        let matching = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.request.symbol == symbol)
            .cloned()
            .collect();
        Ok(newest_first(matching, usize::MAX))
    }

    async fn list_recent(&self, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        let all = self.records.read().await.values().cloned().collect();
        Ok(newest_first(all, limit))
    }

    async fn list_by_creator(&self, creator: &str, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        let matching = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.request.creator_address == creator)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit))
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// One pretty-printed JSON file per launch under a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// mid-write leaves the previous version intact.
pub struct JsonFileLaunchRepository {
    root: PathBuf,
}

impl JsonFileLaunchRepository {
    pub async fn open(root: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn load_all(&self) -> OrchestratorResult<Vec<LaunchRecord>> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read(&path).await?;
            let record: LaunchRecord = serde_json::from_slice(&content).map_err(|e| {
                OrchestratorError::Storage(format!("Corrupt launch record {}: {}", path.display(), e))
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait]
impl LaunchRepository for JsonFileLaunchRepository {
    async fn save(&self, record: &LaunchRecord) -> OrchestratorResult<()> {
        let path = self.record_path(record.id);
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(launch_id = %record.id, state = record.state.name(), "Saved launch record");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> OrchestratorResult<Option<LaunchRecord>> {
        match tokio::fs::read(self.record_path(id)).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_symbol(&self, symbol: &str) -> OrchestratorResult<Vec<LaunchRecord>> {
        let matching = self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| r.request.symbol == symbol)
            .collect();
        Ok(newest_first(matching, usize::MAX))
    }

    async fn list_recent(&self, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        Ok(newest_first(self.load_all().await?, limit))
    }

    async fn list_by_creator(&self, creator: &str, limit: usize) -> OrchestratorResult<Vec<LaunchRecord>> {
        let matching = self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| r.request.creator_address == creator)
            .collect();
        Ok(newest_first(matching, limit))
    }
}
