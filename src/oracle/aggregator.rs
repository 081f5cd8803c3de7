//! Premium Aggregator - Combines domestic, international and rate data
//!
//! For each symbol, fetches the Upbit and Binance quotes concurrently, applies
//! the cached USDT/KRW rate and produces one `PremiumResult`. A failing venue
//! only degrades that symbol's result; the rest of the batch is unaffected.

use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::premium;
use super::rate_cache::RateCache;
use super::sources::{QuoteSource, ReferenceRateSource};
use crate::error::{SourceError, ValidationError};
use crate::types::{
    parse_symbol_list, ConversionRate, HealthReport, PremiumResult, Quote, RateOverview, Symbol,
};

/// Symbols in flight at once when no limit is configured
pub const DEFAULT_MAX_CONCURRENT_SYMBOLS: usize = 4;

pub struct PremiumAggregator {
    domestic: Arc<dyn QuoteSource>,
    international: Arc<dyn QuoteSource>,
    rates: Arc<dyn ReferenceRateSource>,
    rate_cache: Arc<RateCache>,
    /// Asset probed by `check_health`
    health_symbol: Symbol,
    /// Per-batch bound on symbols fetched at once
    max_concurrent_symbols: usize,
}

impl PremiumAggregator {
    pub fn new(
        domestic: Arc<dyn QuoteSource>,
        international: Arc<dyn QuoteSource>,
        rates: Arc<dyn ReferenceRateSource>,
        rate_cache: Arc<RateCache>,
        health_symbol: Symbol,
    ) -> Self {
        Self {
            domestic,
            international,
            rates,
            rate_cache,
            health_symbol,
            max_concurrent_symbols: DEFAULT_MAX_CONCURRENT_SYMBOLS,
        }
    }

    /// Bound how many symbols of a batch hit the venues at once (min 1)
    pub fn with_max_concurrent_symbols(mut self, limit: usize) -> Self {
        self.max_concurrent_symbols = limit.max(1);
        self
    }

    /// One result per input symbol, in input order. The conversion rate is
    /// read once and shared by the whole batch; at most
    /// `max_concurrent_symbols` symbols are fetched at a time.
    pub async fn aggregate(&self, symbols: &[Symbol]) -> Vec<PremiumResult> {
        if symbols.is_empty() {
            return Vec::new();
        }

        let rate = self.rate_cache.get_rate().await;
        let results: Vec<PremiumResult> = stream::iter(symbols)
            .map(|symbol| self.premium_with_rate(symbol.clone(), rate.rate))
            .buffered(self.max_concurrent_symbols)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            symbols = results.len(),
            failed,
            rate = %rate.rate,
            "Premium batch aggregated"
        );
        results
    }

    /// Parse a comma-separated list, then aggregate. Nothing is fetched if
    /// any entry is malformed.
    pub async fn aggregate_list(&self, input: &str) -> Result<Vec<PremiumResult>, ValidationError> {
        let symbols = parse_symbol_list(input)?;
        Ok(self.aggregate(&symbols).await)
    }

    /// Single-symbol form of [`aggregate`](Self::aggregate)
    pub async fn premium_for(&self, symbol: &Symbol) -> PremiumResult {
        let rate = self.rate_cache.get_rate().await;
        self.premium_with_rate(symbol.clone(), rate.rate).await
    }

    /// Cached conversion rate (refreshing if stale)
    pub async fn conversion_rate(&self) -> ConversionRate {
        self.rate_cache.get_rate().await
    }

    /// Fiat benchmark, fetched on demand with no caching
    pub async fn fiat_rate(&self) -> Result<ConversionRate, SourceError> {
        self.rates.fetch_fiat_reference_rate().await
    }

    /// Conversion rate, fiat benchmark and the spread between them
    pub async fn rate_overview(&self) -> RateOverview {
        let (conversion_rate, fiat) =
            tokio::join!(self.rate_cache.get_rate(), self.fiat_rate());

        let fiat_rate = match fiat {
            Ok(rate) => Some(rate),
            Err(e) => {
                tracing::warn!(error = %e, "Fiat benchmark unavailable");
                None
            }
        };

        RateOverview {
            conversion_rate,
            conversion_rate_fresh: self.rate_cache.is_fresh().await,
            fiat_rate,
            rate_premium_percent: fiat_rate
                .and_then(|fiat| premium::rate_spread(conversion_rate.rate, fiat.rate)),
        }
    }

    /// Operator-triggered refresh of the conversion rate
    pub async fn refresh_rate(&self) -> ConversionRate {
        self.rate_cache.force_refresh().await
    }

    /// Probe each upstream once. The rate probe bypasses the cache.
    pub async fn check_health(&self) -> HealthReport {
        let domestic_market = self.domestic.venue().market_code(&self.health_symbol);
        let international_market = self.international.venue().market_code(&self.health_symbol);

        let (domestic, international, rate) = tokio::join!(
            self.domestic.fetch_price(&domestic_market),
            self.international.fetch_price(&international_market),
            self.rates.fetch_conversion_rate(),
        );

        let domestic_ok = usable_quote(domestic).map_err(|reason| {
            tracing::warn!(source = %self.domestic.venue(), %reason, "Health probe failed");
        });
        let international_ok = usable_quote(international).map_err(|reason| {
            tracing::warn!(source = %self.international.venue(), %reason, "Health probe failed");
        });
        let rate_ok = match rate {
            Ok(r) if r.rate > Decimal::ZERO => true,
            Ok(r) => {
                tracing::warn!(rate = %r.rate, "Health probe returned non-positive rate");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conversion rate health probe failed");
                false
            }
        };

        let report = HealthReport::new(domestic_ok.is_ok(), international_ok.is_ok(), rate_ok);
        tracing::info!(
            domestic = report.domestic_connected,
            international = report.international_connected,
            conversion_rate = report.conversion_rate_connected,
            "Health check"
        );
        report
    }

    async fn premium_with_rate(&self, symbol: Symbol, rate: Decimal) -> PremiumResult {
        let domestic_venue = self.domestic.venue();
        let international_venue = self.international.venue();
        let domestic_market = domestic_venue.market_code(&symbol);
        let international_market = international_venue.market_code(&symbol);

        let (domestic, international) = tokio::join!(
            self.domestic.fetch_price(&domestic_market),
            self.international.fetch_price(&international_market),
        );

        let (domestic, international) = match (usable_quote(domestic), usable_quote(international)) {
            (Ok(d), Ok(i)) => (d, i),
            (d, i) => {
                let reason = [d.err(), i.err()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::warn!(symbol = %symbol, %reason, "Quote unavailable");
                return PremiumResult::error(symbol, domestic_venue, international_venue, reason);
            }
        };

        match premium::compute(domestic.price, international.price, rate) {
            Some(breakdown) => {
                tracing::debug!(
                    symbol = %symbol,
                    premium = %breakdown.premium_percent,
                    "Premium computed"
                );
                PremiumResult::success(symbol, &domestic, &international, rate, breakdown)
            }
            None => {
                let reason = format!(
                    "cannot compute premium (international={}, rate={})",
                    international.price, rate
                );
                tracing::warn!(symbol = %symbol, %reason, "Premium skipped");
                PremiumResult::error(symbol, domestic_venue, international_venue, reason)
            }
        }
    }
}

/// A quote that can feed the calculator, or the reason it cannot
fn usable_quote(result: Result<Quote, SourceError>) -> Result<Quote, String> {
    match result {
        Ok(quote) if quote.price > Decimal::ZERO => Ok(quote),
        Ok(quote) => Err(format!(
            "{} returned non-positive price {} for {}",
            quote.venue.name(),
            quote.price,
            quote.market
        )),
        Err(e) => Err(e.to_string()),
    }
}
