//! Monitoring cycles and the interval-driven loop

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::domain::price::{detect_change, PriceChangeEvent, PriceDirection};
use crate::infrastructure::persistence::{HistoryStore, TIMESTAMP_FORMAT};
use crate::infrastructure::providers::PriceProvider;
use crate::shared::errors::{AppError, FetchError};
use crate::shared::types::Product;
use crate::shared::utils::format_price;

use super::scheduler::{CycleScheduler, ShutdownSignal};

/// Default delay between monitoring cycles, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default number of records kept per product
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Outcome of one product's fetch within a cycle
#[derive(Debug, Clone)]
pub struct ProductOutcome {
    pub product: Product,
    pub result: Result<f64, FetchError>,
}

/// Everything one cycle produced
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub events: Vec<PriceChangeEvent>,
    pub outcomes: Vec<ProductOutcome>,
}

impl CycleReport {
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Drives monitoring passes over the configured products
pub struct PriceMonitor {
    provider: Box<dyn PriceProvider>,
    store: HistoryStore,
    max_history: usize,
}

impl PriceMonitor {
    pub fn new(provider: Box<dyn PriceProvider>, store: HistoryStore, max_history: usize) -> Self {
        Self {
            provider,
            store,
            max_history,
        }
    }

    /// One full pass: fetch each product, update its history, detect
    /// changes, then persist the snapshot exactly once
    ///
    /// A fetch failure skips that product for this cycle and leaves its
    /// history untouched; only a failed save aborts the cycle.
    pub async fn run_cycle(
        &mut self,
        products: &[Product],
        timestamp: DateTime<Local>,
    ) -> Result<CycleReport, AppError> {
        self.cycle_with(products, timestamp, None).await
    }

    /// Single interactive pass for the `check` command
    pub async fn run_once(&mut self, products: &[Product]) -> Result<CycleReport, AppError> {
        let report = self.run_cycle(products, Local::now()).await?;
        log_report(&report);
        Ok(report)
    }

    /// Run cycles forever, sleeping between them, until shutdown
    pub async fn run_loop(
        &mut self,
        products: &[Product],
        scheduler: &mut dyn CycleScheduler,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), AppError> {
        loop {
            let timestamp = Local::now();
            info!("[{}] 🔍 checking prices...", timestamp.format(TIMESTAMP_FORMAT));

            let report = self.cycle_with(products, timestamp, Some(&shutdown)).await?;
            log_report(&report);

            if shutdown.is_triggered() {
                info!("🛑 shutdown requested, stopping monitor");
                return Ok(());
            }

            tokio::select! {
                _ = scheduler.wait_until_next_tick() => {}
                _ = shutdown.triggered() => {
                    info!("🛑 shutdown requested, stopping monitor");
                    return Ok(());
                }
            }
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    async fn cycle_with(
        &mut self,
        products: &[Product],
        timestamp: DateTime<Local>,
        shutdown: Option<&ShutdownSignal>,
    ) -> Result<CycleReport, AppError> {
        let mut report = CycleReport::default();

        for product in products {
            if shutdown.is_some_and(|signal| signal.is_triggered()) {
                info!("🛑 shutdown requested, finishing cycle early");
                break;
            }

            let result = self.provider.fetch_price(&product.id).await;
            if let Ok(price) = result {
                let (old_current, _) = self.store.update(
                    &product.id,
                    &product.name,
                    price,
                    timestamp,
                    self.max_history,
                );
                if let Some(event) = detect_change(&product.name, old_current, price) {
                    report.events.push(event);
                }
            }
            report.outcomes.push(ProductOutcome {
                product: product.clone(),
                result,
            });
        }

        // one persist per cycle, after every product was processed
        self.store.save()?;
        Ok(report)
    }
}

fn log_report(report: &CycleReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(price) => info!("  📦 {}: {}", outcome.product.name, format_price(Some(*price))),
            Err(e) => warn!("  ❌ {}: skipped ({})", outcome.product.name, e),
        }
    }

    if !report.events.is_empty() {
        info!("📊 price changes:");
        for event in &report.events {
            let sign = match event.direction {
                PriceDirection::Increase => "📈",
                PriceDirection::Decrease => "📉",
            };
            info!(
                "  {} {}: {} -> {} ({:+.2}%)",
                sign,
                event.name,
                format_price(Some(event.old_price)),
                format_price(Some(event.new_price)),
                event.percent_change
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scheduler::{shutdown_channel, ShutdownHandle};
    use crate::infrastructure::persistence::MemorySnapshotBackend;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Provider that replays queued responses per SKU
    #[derive(Default)]
    struct ScriptedProvider {
        responses: Mutex<HashMap<String, VecDeque<Result<f64, FetchError>>>>,
    }

    impl ScriptedProvider {
        fn push(&self, sku: &str, result: Result<f64, FetchError>) {
            self.responses
                .lock()
                .unwrap()
                .entry(sku.to_string())
                .or_default()
                .push_back(result);
        }
    }

    #[async_trait]
    impl PriceProvider for ScriptedProvider {
        async fn fetch_price(&self, sku_id: &str) -> Result<f64, FetchError> {
            self.responses
                .lock()
                .unwrap()
                .get_mut(sku_id)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(Err(FetchError::Network("no scripted response".to_string())))
        }
    }

    fn ts(minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 7, 10, minute, 0).unwrap()
    }

    fn monitor_with(
        provider: ScriptedProvider,
        backend: MemorySnapshotBackend,
        max_history: usize,
    ) -> PriceMonitor {
        let store = HistoryStore::open(Box::new(backend));
        PriceMonitor::new(Box::new(provider), store, max_history)
    }

    #[tokio::test]
    async fn test_five_cycle_scenario() {
        let provider = ScriptedProvider::default();
        for price in [299.0, 279.0, 280.0, 281.0, 282.0] {
            provider.push("SKU1", Ok(price));
        }
        let backend = MemorySnapshotBackend::new();
        let mut monitor = monitor_with(provider, backend.clone(), 3);
        let products = vec![Product::new("RAM-A", "SKU1")];

        // cycle 1: first observation, no event
        let report = monitor.run_cycle(&products, ts(0)).await.unwrap();
        assert!(report.events.is_empty());
        let entry = &monitor.store().snapshot()["SKU1"];
        assert_eq!(entry.history.len(), 1);
        assert_eq!(entry.current, Some(299.0));

        // cycle 2: price drop
        let report = monitor.run_cycle(&products, ts(5)).await.unwrap();
        assert_eq!(report.events.len(), 1);
        let event = &report.events[0];
        assert_eq!(event.old_price, 299.0);
        assert_eq!(event.new_price, 279.0);
        assert_eq!(event.percent_change, -6.69);
        assert_eq!(event.direction, PriceDirection::Decrease);
        assert_eq!(monitor.store().snapshot()["SKU1"].history.len(), 2);

        // cycles 3-5: the window stays bounded at the three most recent
        for (i, _) in [280.0, 281.0, 282.0].iter().enumerate() {
            monitor.run_cycle(&products, ts(10 + i as u32)).await.unwrap();
        }
        let entry = &monitor.store().snapshot()["SKU1"];
        let prices: Vec<f64> = entry.history.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![280.0, 281.0, 282.0]);
        assert_eq!(entry.current, Some(282.0));

        // every cycle persisted exactly once
        assert_eq!(backend.save_count(), 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let provider = ScriptedProvider::default();
        provider.push("SKU1", Err(FetchError::Timeout));
        provider.push("SKU2", Ok(459.0));
        let backend = MemorySnapshotBackend::new();
        let mut monitor = monitor_with(provider, backend.clone(), 100);
        let products = vec![Product::new("RAM-A", "SKU1"), Product::new("RAM-B", "SKU2")];

        let report = monitor.run_cycle(&products, ts(0)).await.unwrap();

        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            report.outcomes[0].result,
            Err(FetchError::Timeout)
        ));
        // the failed product has no entry, the healthy one does
        assert!(!monitor.store().snapshot().contains_key("SKU1"));
        assert_eq!(monitor.store().snapshot()["SKU2"].current, Some(459.0));
        assert_eq!(backend.save_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_history_unchanged() {
        let provider = ScriptedProvider::default();
        provider.push("SKU1", Ok(299.0));
        provider.push("SKU1", Err(FetchError::Network("connection reset".to_string())));
        let mut monitor = monitor_with(provider, MemorySnapshotBackend::new(), 100);
        let products = vec![Product::new("RAM-A", "SKU1")];

        monitor.run_cycle(&products, ts(0)).await.unwrap();
        let report = monitor.run_cycle(&products, ts(5)).await.unwrap();

        assert!(report.events.is_empty());
        let entry = &monitor.store().snapshot()["SKU1"];
        assert_eq!(entry.history.len(), 1);
        assert_eq!(entry.current, Some(299.0));
    }

    #[tokio::test]
    async fn test_run_once_saves_exactly_once() {
        let provider = ScriptedProvider::default();
        provider.push("SKU1", Ok(299.0));
        let backend = MemorySnapshotBackend::new();
        let mut monitor = monitor_with(provider, backend.clone(), 100);

        let report = monitor
            .run_once(&[Product::new("RAM-A", "SKU1")])
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(backend.save_count(), 1);
        assert_eq!(backend.saved_snapshot().unwrap()["SKU1"].current, Some(299.0));
    }

    #[tokio::test]
    async fn test_events_follow_product_order() {
        let provider = ScriptedProvider::default();
        for sku in ["SKU1", "SKU2"] {
            provider.push(sku, Ok(100.0));
            provider.push(sku, Ok(110.0));
        }
        let mut monitor = monitor_with(provider, MemorySnapshotBackend::new(), 100);
        let products = vec![Product::new("RAM-A", "SKU1"), Product::new("RAM-B", "SKU2")];

        monitor.run_cycle(&products, ts(0)).await.unwrap();
        let report = monitor.run_cycle(&products, ts(5)).await.unwrap();

        let names: Vec<&str> = report.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["RAM-A", "RAM-B"]);
    }

    /// Scheduler that lets a fixed number of cycles through, then
    /// requests shutdown and parks
    struct CountingScheduler {
        remaining: usize,
        handle: Option<ShutdownHandle>,
    }

    #[async_trait]
    impl CycleScheduler for CountingScheduler {
        async fn wait_until_next_tick(&mut self) {
            if self.remaining == 0 {
                if let Some(handle) = self.handle.take() {
                    handle.trigger();
                }
                std::future::pending::<()>().await;
            }
            self.remaining -= 1;
        }
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let provider = ScriptedProvider::default();
        for price in [299.0, 279.0, 280.0] {
            provider.push("SKU1", Ok(price));
        }
        let backend = MemorySnapshotBackend::new();
        let mut monitor = monitor_with(provider, backend.clone(), 100);
        let products = vec![Product::new("RAM-A", "SKU1")];

        let (handle, shutdown) = shutdown_channel();
        let mut scheduler = CountingScheduler {
            remaining: 2,
            handle: Some(handle),
        };

        monitor
            .run_loop(&products, &mut scheduler, shutdown)
            .await
            .unwrap();

        // three cycles ran, each persisted, before the shutdown landed
        assert_eq!(backend.save_count(), 3);
        assert_eq!(monitor.store().snapshot()["SKU1"].history.len(), 3);
    }

    #[tokio::test]
    async fn test_run_loop_flushes_when_shutdown_preempts() {
        let provider = ScriptedProvider::default();
        provider.push("SKU1", Ok(299.0));
        let backend = MemorySnapshotBackend::new();
        let mut monitor = monitor_with(provider, backend.clone(), 100);

        let (handle, shutdown) = shutdown_channel();
        let mut scheduler = CountingScheduler {
            remaining: usize::MAX,
            handle: None,
        };
        handle.trigger();

        monitor
            .run_loop(&[Product::new("RAM-A", "SKU1")], &mut scheduler, shutdown)
            .await
            .unwrap();

        // the already-started cycle still persisted before the loop quit
        assert_eq!(backend.save_count(), 1);
    }
}
