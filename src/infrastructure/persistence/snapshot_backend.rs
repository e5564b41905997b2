//! Load/save backends for the price history snapshot

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::price::HistorySnapshot;
use crate::shared::errors::StoreError;

/// Storage backend for the whole history snapshot
///
/// The snapshot is persisted as one document, replaced wholesale on every
/// save. Injected into `HistoryStore` so tests can run against memory.
pub trait SnapshotBackend: Send {
    fn load(&self) -> Result<HistorySnapshot, StoreError>;
    fn save(&mut self, snapshot: &HistorySnapshot) -> Result<(), StoreError>;
}

/// File-backed snapshot storage
pub struct JsonSnapshotBackend {
    path: PathBuf,
}

impl JsonSnapshotBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotBackend for JsonSnapshotBackend {
    fn load(&self) -> Result<HistorySnapshot, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&mut self, snapshot: &HistorySnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}

/// Write to a sibling temp file and rename over the target, so an
/// interrupted save never leaves a truncated document behind
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), std::io::Error> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// In-memory backend for deterministic tests
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemorySnapshotBackend {
    state: std::sync::Arc<std::sync::Mutex<MemoryState>>,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryState {
    snapshot: Option<HistorySnapshot>,
    save_count: usize,
}

#[cfg(test)]
impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_snapshot(&self) -> Option<HistorySnapshot> {
        self.state.lock().unwrap().snapshot.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().unwrap().save_count
    }
}

#[cfg(test)]
impl SnapshotBackend for MemorySnapshotBackend {
    fn load(&self) -> Result<HistorySnapshot, StoreError> {
        match self.state.lock().unwrap().snapshot.clone() {
            Some(snapshot) => Ok(snapshot),
            None => Err(StoreError::NotFound),
        }
    }

    fn save(&mut self, snapshot: &HistorySnapshot) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.snapshot = Some(snapshot.clone());
        state.save_count += 1;
        Ok(())
    }
}
