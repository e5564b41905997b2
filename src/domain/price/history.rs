//! Bounded per-product price history

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PriceRecord;

/// All tracked product histories, keyed by SKU id
///
/// BTreeMap keeps iteration and serialization order stable across runs.
pub type HistorySnapshot = BTreeMap<String, ProductHistory>;

/// Historical record for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHistory {
    pub name: String,
    pub history: Vec<PriceRecord>,
    pub current: Option<f64>,
}

impl ProductHistory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: Vec::new(),
            current: None,
        }
    }

    /// Append an observation, dropping the oldest records beyond
    /// `max_history`. Returns the previous current price.
    ///
    /// Crate-internal: all mutation goes through `HistoryStore::update`.
    pub(crate) fn append(&mut self, time: String, price: f64, max_history: usize) -> Option<f64> {
        let old_current = self.current;
        self.history.push(PriceRecord { time, price });
        if self.history.len() > max_history {
            let excess = self.history.len() - max_history;
            self.history.drain(..excess);
        }
        self.current = Some(price);
        old_current
    }
}
