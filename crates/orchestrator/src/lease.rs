//! Per-launch driver leases and symbol reservations

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Default)]
struct LeaseTable {
    launches: HashSet<Uuid>,
    symbols: HashSet<String>,
    /// Cancellations waiting for the driver of a held launch
    cancel_requests: HashSet<Uuid>,
}

/// Launch ids being driven and symbols being registered in this process.
///
/// At most one guard exists per key; dropping the guard releases it. A
/// launch's pending cancellation lives only as long as its lease.
#[derive(Debug, Clone, Default)]
pub struct LaunchLeases {
    table: Arc<Mutex<LeaseTable>>,
}

#[derive(Debug)]
enum LeaseKey {
    Launch(Uuid),
    Symbol(String),
}

/// Exclusive right to drive one launch, or to register one symbol
#[derive(Debug)]
pub struct LeaseGuard {
    key: LeaseKey,
    table: Arc<Mutex<LeaseTable>>,
}

impl LaunchLeases {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> OrchestratorResult<MutexGuard<'_, LeaseTable>> {
        self.table
            .lock()
            .map_err(|_| OrchestratorError::Storage("lease table poisoned".to_string()))
    }

    fn guard(&self, key: LeaseKey) -> LeaseGuard {
        LeaseGuard {
            key,
            table: Arc::clone(&self.table),
        }
    }

    /// Take the lease for `id`, failing with `LaunchBusy` if it is held
    pub fn acquire(&self, id: Uuid) -> OrchestratorResult<LeaseGuard> {
        if !self.lock()?.launches.insert(id) {
            return Err(OrchestratorError::LaunchBusy(id));
        }
        Ok(self.guard(LeaseKey::Launch(id)))
    }

    /// Hold `symbol` while a new launch for it is checked and saved
    pub fn reserve_symbol(&self, symbol: &str) -> OrchestratorResult<LeaseGuard> {
        if !self.lock()?.symbols.insert(symbol.to_string()) {
            return Err(OrchestratorError::SymbolTaken(symbol.to_string()));
        }
        Ok(self.guard(LeaseKey::Symbol(symbol.to_string())))
    }

    /// Ask the current driver of `id` to stop before its next step.
    ///
    /// Returns `false` when nobody holds the lease, in which case nothing is
    /// recorded.
    pub fn request_cancel(&self, id: Uuid) -> OrchestratorResult<bool> {
        let mut table = self.lock()?;
        if !table.launches.contains(&id) {
            return Ok(false);
        }
        table.cancel_requests.insert(id);
        Ok(true)
    }

    pub fn take_cancel_request(&self, id: Uuid) -> bool {
        self.lock()
            .map(|mut table| table.cancel_requests.remove(&id))
            .unwrap_or(false)
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if let Ok(mut table) = self.table.lock() {
            match &self.key {
                LeaseKey::Launch(id) => {
                    table.launches.remove(id);
                    table.cancel_requests.remove(id);
                }
                LeaseKey::Symbol(symbol) => {
                    table.symbols.remove(symbol);
                }
            }
        }
    }
}
