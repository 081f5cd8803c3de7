//! Configuration management for PremiumBot
//!
//! Loads from optional config files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::types::{parse_symbol_list, Symbol};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub sources: SourcesConfig,
    pub rate_cache: RateCacheConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Assets polled by the binary when no dashboard is served
    pub assets: Vec<String>,
    /// Asset used to probe venue connectivity
    pub health_symbol: String,
    /// Poll interval in seconds
    pub poll_interval_secs: u64,
    /// Symbols fetched at once within a batch
    pub max_concurrent_symbols: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Upbit REST base URL (domestic venue + USDT/KRW rate)
    pub upbit_url: String,
    /// Binance REST base URL (international venue)
    pub binance_url: String,
    /// open.er-api.com base URL (USD/KRW benchmark)
    pub fiat_rate_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateCacheConfig {
    /// Max age in seconds before a refresh is attempted
    pub staleness_secs: u64,
    /// Rate served before the first successful fetch
    pub default_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Serve the REST API (requires the `dashboard` feature)
    pub enabled: bool,
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Market defaults
            .set_default("market.assets", vec!["BTC", "ETH", "XRP"])?
            .set_default("market.health_symbol", "BTC")?
            .set_default("market.poll_interval_secs", 10)?
            .set_default("market.max_concurrent_symbols", 4)?
            // Source defaults
            .set_default("sources.upbit_url", "https://api.upbit.com")?
            .set_default("sources.binance_url", "https://api.binance.com")?
            .set_default("sources.fiat_rate_url", "https://open.er-api.com")?
            .set_default("sources.request_timeout_ms", 5000)?
            // Rate cache defaults
            .set_default("rate_cache.staleness_secs", 300)?
            .set_default("rate_cache.default_rate", 1350.0)?
            // Dashboard defaults
            .set_default("dashboard.enabled", true)?
            .set_default("dashboard.bind_addr", "0.0.0.0:8080")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PREMIUMBOT__*)
            .add_source(Environment::with_prefix("PREMIUMBOT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject values that would break the cache or source invariants
    pub fn validate(&self) -> Result<()> {
        if !(self.rate_cache.default_rate.is_finite() && self.rate_cache.default_rate > 0.0) {
            bail!(
                "rate_cache.default_rate must be positive, got {}",
                self.rate_cache.default_rate
            );
        }
        if self.market.max_concurrent_symbols == 0 {
            bail!("market.max_concurrent_symbols must be greater than zero");
        }
        if self.sources.request_timeout_ms == 0 {
            bail!("sources.request_timeout_ms must be greater than zero");
        }
        self.assets()?;
        self.health_symbol()?;
        Ok(())
    }

    pub fn assets(&self) -> Result<Vec<Symbol>> {
        parse_symbol_list(&self.market.assets.join(",")).context("Invalid market.assets")
    }

    pub fn health_symbol(&self) -> Result<Symbol> {
        Symbol::parse(&self.market.health_symbol).context("Invalid market.health_symbol")
    }

    pub fn default_rate(&self) -> Result<Decimal> {
        Decimal::try_from(self.rate_cache.default_rate)
            .context("rate_cache.default_rate is not representable as a decimal")
    }

    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.rate_cache.staleness_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.sources.request_timeout_ms)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "assets={:?} concurrency={} staleness={}s default_rate={} timeout={}ms dashboard={}",
            self.market.assets,
            self.market.max_concurrent_symbols,
            self.rate_cache.staleness_secs,
            self.rate_cache.default_rate,
            self.sources.request_timeout_ms,
            self.dashboard.enabled
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
