//! Durable product price histories

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::domain::price::{HistorySnapshot, ProductHistory};
use crate::shared::errors::StoreError;

use super::snapshot_backend::SnapshotBackend;

/// Wire format for record timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Owns the in-memory snapshot and its persistence backend
///
/// All history mutation goes through `update`; callers only ever borrow
/// the snapshot for reading.
pub struct HistoryStore {
    backend: Box<dyn SnapshotBackend>,
    snapshot: HistorySnapshot,
}

impl HistoryStore {
    /// Load persisted state, degrading to an empty snapshot when the
    /// backing document is absent or unreadable
    pub fn open(backend: Box<dyn SnapshotBackend>) -> Self {
        let snapshot = match backend.load() {
            Ok(snapshot) => snapshot,
            Err(StoreError::NotFound) => {
                info!("no price history found, starting fresh");
                HistorySnapshot::new()
            }
            Err(e) => {
                warn!("⚠️ price history unreadable ({}), starting with an empty snapshot", e);
                HistorySnapshot::new()
            }
        };
        Self { backend, snapshot }
    }

    /// Record one observation for a product
    ///
    /// Creates the entry on first sight, trims to `max_history` oldest
    /// first, sets the current price, and returns the previous current
    /// alongside the updated entry.
    pub fn update(
        &mut self,
        id: &str,
        name: &str,
        price: f64,
        timestamp: DateTime<Local>,
        max_history: usize,
    ) -> (Option<f64>, &ProductHistory) {
        let entry = self
            .snapshot
            .entry(id.to_string())
            .or_insert_with(|| ProductHistory::new(name));
        let time = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let old_current = entry.append(time, price, max_history);
        (old_current, entry)
    }

    /// Persist the whole snapshot in one atomic replace
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.backend.save(&self.snapshot)
    }

    pub fn snapshot(&self) -> &HistorySnapshot {
        &self.snapshot
    }
}
