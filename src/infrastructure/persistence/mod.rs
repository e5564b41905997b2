pub mod config_store;
pub mod history_store;
pub mod snapshot_backend;

pub use config_store::{ConfigStore, MonitorConfig};
pub use history_store::{HistoryStore, TIMESTAMP_FORMAT};
pub use snapshot_backend::{JsonSnapshotBackend, SnapshotBackend};

#[cfg(test)]
pub use snapshot_backend::MemorySnapshotBackend;
