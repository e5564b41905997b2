use async_trait::async_trait;

use crate::shared::errors::FetchError;

/// Trait for price provider adapters
/// This gives the monitor a single lookup call regardless of how the
/// provider resolves it internally
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the current price for a SKU
    ///
    /// Yields a positive price or a classified failure. A failure for one
    /// SKU is independent of every other SKU in the same cycle.
    async fn fetch_price(&self, sku_id: &str) -> Result<f64, FetchError>;
}
