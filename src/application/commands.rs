//! CLI commands and handlers

use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::application::monitor::{PriceMonitor, DEFAULT_INTERVAL_SECS, DEFAULT_MAX_HISTORY};
use crate::application::scheduler::{shutdown_channel, IntervalScheduler};
use crate::infrastructure::persistence::{
    ConfigStore, HistoryStore, JsonSnapshotBackend, SnapshotBackend, TIMESTAMP_FORMAT,
};
use crate::infrastructure::providers::JdPriceClient;
use crate::shared::errors::{AppError, StoreError};
use crate::shared::types::Product;
use crate::shared::utils::format_price;

const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "price_history.json";

/// Records shown per product by the `history` command
const HISTORY_DISPLAY_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(version, about = "JD.com price monitor with bounded history and change alerts")]
pub struct Cli {
    /// Path to the product config document
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: String,

    /// Path to the persisted price history snapshot
    #[arg(long, global = true, default_value = HISTORY_FILE)]
    pub history_file: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Monitor prices continuously
    Monitor {
        /// Seconds between cycles
        #[arg(default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Records kept per product
        #[arg(long, default_value_t = DEFAULT_MAX_HISTORY)]
        max_history: usize,
    },

    /// Check all prices once
    Check,

    /// Add a product to the monitored set
    Add {
        /// Display name
        name: String,

        /// JD SKU id
        sku_id: String,
    },

    /// List monitored products
    List,

    /// Show recorded price history
    History {
        /// Restrict output to one SKU
        sku_id: Option<String>,
    },

    /// Reset the config document to the default products
    Init,
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(cli: Cli) -> Result<(), AppError> {
        let config_store = ConfigStore::new(&cli.config);

        match cli.command {
            Commands::Monitor {
                interval,
                max_history,
            } => Self::execute_monitor(&cli.history_file, &config_store, interval, max_history).await,
            Commands::Check => Self::execute_check(&cli.history_file, &config_store).await,
            Commands::Add { name, sku_id } => Self::execute_add(&config_store, &name, &sku_id),
            Commands::List => Self::execute_list(&config_store),
            Commands::History { sku_id } => {
                Self::execute_history(&cli.history_file, sku_id.as_deref())
            }
            Commands::Init => Self::execute_init(&config_store, &cli.config),
        }
    }

    async fn execute_monitor(
        history_file: &str,
        config_store: &ConfigStore,
        interval: u64,
        max_history: usize,
    ) -> Result<(), AppError> {
        let products = config_store.load().products();
        if products.is_empty() {
            error!("❌ no products configured, run `add` or `init` first");
            return Ok(());
        }

        info!("🖥️  price monitor starting");
        info!("   products: {}", products.len());
        info!("   interval: {}s", interval);
        info!("   started:  {}", Local::now().format(TIMESTAMP_FORMAT));

        let mut monitor = Self::build_monitor(history_file, max_history);

        let (handle, shutdown) = shutdown_channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl-C");
                handle.trigger();
            }
        });

        let mut scheduler = IntervalScheduler::new(Duration::from_secs(interval));
        monitor.run_loop(&products, &mut scheduler, shutdown).await
    }

    async fn execute_check(history_file: &str, config_store: &ConfigStore) -> Result<(), AppError> {
        let products = config_store.load().products();
        if products.is_empty() {
            error!("❌ no products configured, run `add` or `init` first");
            return Ok(());
        }

        info!("🖥️  checking {} products...", products.len());
        let mut monitor = Self::build_monitor(history_file, DEFAULT_MAX_HISTORY);
        let report = monitor.run_once(&products).await?;

        if report.failure_count() > 0 {
            warn!("⚠️ {} of {} lookups failed", report.failure_count(), products.len());
        }
        Ok(())
    }

    fn execute_add(config_store: &ConfigStore, name: &str, sku_id: &str) -> Result<(), AppError> {
        config_store.add_product(name, sku_id)?;
        info!("✅ added: {} (SKU: {})", name, sku_id);
        Ok(())
    }

    fn execute_list(config_store: &ConfigStore) -> Result<(), AppError> {
        let config = config_store.load();
        if config.products.is_empty() {
            info!("📦 no products configured");
            return Ok(());
        }

        info!("📦 monitored products:");
        for (i, Product { name, id }) in config.products().iter().enumerate() {
            info!("  {}. {} (SKU: {})", i + 1, name, id);
        }
        Ok(())
    }

    /// Read-only view over the persisted snapshot; never touches the
    /// monitor's write path
    fn execute_history(history_file: &str, sku_filter: Option<&str>) -> Result<(), AppError> {
        let backend = JsonSnapshotBackend::new(history_file);
        let snapshot = match backend.load() {
            Ok(snapshot) => snapshot,
            Err(StoreError::NotFound) => {
                info!("no price history recorded yet");
                return Ok(());
            }
            Err(e) => {
                warn!("⚠️ price history unreadable: {}", e);
                return Ok(());
            }
        };

        let mut shown = 0;
        for (sku, entry) in &snapshot {
            if sku_filter.is_some_and(|filter| filter != sku) {
                continue;
            }
            shown += 1;

            info!("📦 {} (SKU: {})", entry.name, sku);
            let start = entry.history.len().saturating_sub(HISTORY_DISPLAY_LIMIT);
            for record in &entry.history[start..] {
                info!("  {}: {}", record.time, format_price(Some(record.price)));
            }
            if entry.history.len() > HISTORY_DISPLAY_LIMIT {
                info!("  ... {} records total", entry.history.len());
            }
        }

        if shown == 0 {
            info!("no price history recorded yet");
        }
        Ok(())
    }

    fn execute_init(config_store: &ConfigStore, path: &str) -> Result<(), AppError> {
        config_store.reset()?;
        info!("✅ config initialized with default products");
        info!("📁 config file: {}", path);
        Ok(())
    }

    fn build_monitor(history_file: &str, max_history: usize) -> PriceMonitor {
        let store = HistoryStore::open(Box::new(JsonSnapshotBackend::new(history_file)));
        PriceMonitor::new(Box::new(JdPriceClient::new()), store, max_history)
    }
}
