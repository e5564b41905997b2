//! Price domain - product histories and change detection

mod change_detector;
mod history;

pub use change_detector::detect_change;
pub use history::{HistorySnapshot, ProductHistory};

use serde::{Deserialize, Serialize};

/// A single observed price at a point in time, immutable once appended
///
/// `time` carries the local wall-clock timestamp in the persisted
/// `%Y-%m-%d %H:%M:%S` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub time: String,
    pub price: f64,
}

/// Direction of a detected price change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    Increase,
    Decrease,
}

/// A classified price change
///
/// Produced while a cycle runs and reported at its end; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChangeEvent {
    pub name: String,
    pub old_price: f64,
    pub new_price: f64,
    pub percent_change: f64,
    pub direction: PriceDirection,
}
