//! Product configuration document

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::shared::errors::StoreError;
use crate::shared::types::Product;

use super::snapshot_backend::write_atomic;

/// Products tracked when no config document exists yet
const DEFAULT_PRODUCTS: &[(&str, &str)] = &[
    ("金士顿DDR4 3200 16GB", "100026643164"),
    ("金士顿DDR5 5600 32GB", "100028908789"),
    ("芝奇DDR4 3600 16GB", "100026643165"),
    ("威刚DDR4 3200 16GB", "100026643166"),
];

/// The monitored product set, keyed display name -> SKU id
///
/// BTreeMap gives the monitor a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub products: BTreeMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            products: DEFAULT_PRODUCTS
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        }
    }
}

impl MonitorConfig {
    pub fn products(&self) -> Vec<Product> {
        self.products
            .iter()
            .map(|(name, id)| Product::new(name, id))
            .collect()
    }
}

/// Loads and mutates the product config document
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// An absent document yields the defaults; an unreadable one is
    /// reported and also degrades to the defaults
    pub fn load(&self) -> MonitorConfig {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return MonitorConfig::default(),
            Err(e) => {
                warn!("⚠️ config {} unreadable ({}), using defaults", self.path.display(), e);
                return MonitorConfig::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ config {} malformed ({}), using defaults", self.path.display(), e);
                MonitorConfig::default()
            }
        }
    }

    pub fn save(&self, config: &MonitorConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Insert or overwrite one product mapping and persist
    pub fn add_product(&self, name: &str, id: &str) -> Result<(), StoreError> {
        let mut config = self.load();
        config.products.insert(name.to_string(), id.to_string());
        self.save(&config)
    }

    /// Reset the document to the default product set
    pub fn reset(&self) -> Result<(), StoreError> {
        self.save(&MonitorConfig::default())
    }
}
