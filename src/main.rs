//! PremiumBot - Cross-exchange premium monitor
//!
//! Serves the dashboard API when enabled, otherwise polls the configured
//! assets and logs their premium until ctrl-c.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use premiumbot::config::AppConfig;
use premiumbot::logging;
use premiumbot::oracle::premium::round_for_display;
use premiumbot::oracle::sources::{
    BinanceClient, FiatRateClient, QuoteSource, ReferenceRateSource, ReferenceRates, UpbitClient,
};
use premiumbot::oracle::{PremiumAggregator, RateCache};
use premiumbot::types::Symbol;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging);

    tracing::info!("Starting PremiumBot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Config: {}", config.digest());

    let aggregator = Arc::new(build_aggregator(&config)?);

    if config.dashboard.enabled {
        #[cfg(feature = "dashboard")]
        {
            return premiumbot::dashboard::start_server(aggregator, &config.dashboard.bind_addr)
                .await;
        }

        #[cfg(not(feature = "dashboard"))]
        tracing::warn!("dashboard.enabled is set but the `dashboard` feature is not compiled in; polling instead");
    }

    run_poll_loop(aggregator, config.assets()?, config.market.poll_interval_secs).await;
    Ok(())
}

fn build_aggregator(config: &AppConfig) -> Result<PremiumAggregator> {
    let timeout = config.request_timeout();

    let upbit = UpbitClient::new(&config.sources.upbit_url, timeout)
        .context("Failed to create Upbit client")?;
    let binance = BinanceClient::new(&config.sources.binance_url, timeout)
        .context("Failed to create Binance client")?;
    let fiat = FiatRateClient::new(&config.sources.fiat_rate_url, timeout)
        .context("Failed to create fiat rate client")?;

    let rates: Arc<dyn ReferenceRateSource> = Arc::new(ReferenceRates::new(upbit.clone(), fiat));
    let cache = Arc::new(RateCache::new(
        rates.clone(),
        config.default_rate()?,
        config.staleness(),
    ));

    let domestic: Arc<dyn QuoteSource> = Arc::new(upbit);
    let international: Arc<dyn QuoteSource> = Arc::new(binance);

    Ok(PremiumAggregator::new(
        domestic,
        international,
        rates,
        cache,
        config.health_symbol()?,
    )
    .with_max_concurrent_symbols(config.market.max_concurrent_symbols))
}

async fn run_poll_loop(aggregator: Arc<PremiumAggregator>, assets: Vec<Symbol>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for result in aggregator.aggregate(&assets).await {
                    match result.premium_percent {
                        Some(premium) if result.is_success() => tracing::info!(
                            symbol = %result.symbol,
                            premium = %round_for_display(premium, 2),
                            domestic = ?result.domestic_price,
                            international = ?result.international_price,
                            rate = ?result.conversion_rate,
                            "Premium"
                        ),
                        _ => tracing::warn!(
                            symbol = %result.symbol,
                            error = result.error.as_deref().unwrap_or("unknown"),
                            "Premium unavailable"
                        ),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
}
