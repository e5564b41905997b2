//! Pricewatch - JD.com price monitor
//! Bounded per-product price history, change detection, durable snapshots

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::monitor::PriceMonitor;
pub use domain::price::{PriceChangeEvent, ProductHistory};
pub use infrastructure::persistence::{ConfigStore, HistoryStore};
pub use infrastructure::providers::{JdPriceClient, PriceProvider};
