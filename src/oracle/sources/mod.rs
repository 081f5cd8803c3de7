//! Price source implementations (Upbit, Binance, open.er-api)
//!
//! Each client performs exactly one HTTP request per call, bounded by the
//! configured timeout, and reports every failure as a [`SourceError`].
//! Nothing here retries; callers decide between a fallback value and an
//! error-status result.

mod binance;
mod fiat;
mod http;
mod upbit;

pub use binance::BinanceClient;
pub use fiat::FiatRateClient;
pub use upbit::UpbitClient;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::SourceError;
use crate::types::{ConversionRate, Quote, Venue};

/// A venue's public ticker endpoint
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// The venue this source reads from
    fn venue(&self) -> Venue;

    /// Fetch the latest trade price for a venue-native market identifier
    async fn fetch_price(&self, market: &str) -> Result<Quote, SourceError>;
}

/// Rates used to bring international prices into domestic currency
#[async_trait]
pub trait ReferenceRateSource: Send + Sync {
    /// Pegged asset (USDT) priced in domestic currency; backs the rate cache
    async fn fetch_conversion_rate(&self) -> Result<ConversionRate, SourceError>;

    /// Independent fiat benchmark (USD in domestic currency), informational only
    async fn fetch_fiat_reference_rate(&self) -> Result<ConversionRate, SourceError>;
}

/// Upbit USDT/KRW for the conversion rate, open.er-api USD/KRW for the benchmark
#[derive(Debug, Clone)]
pub struct ReferenceRates {
    upbit: UpbitClient,
    fiat: FiatRateClient,
}

impl ReferenceRates {
    /// Upbit market whose trade price is the conversion rate
    pub const CONVERSION_MARKET: &'static str = "KRW-USDT";

    pub fn new(upbit: UpbitClient, fiat: FiatRateClient) -> Self {
        Self { upbit, fiat }
    }
}

#[async_trait]
impl ReferenceRateSource for ReferenceRates {
    async fn fetch_conversion_rate(&self) -> Result<ConversionRate, SourceError> {
        let quote = self.upbit.fetch_price(Self::CONVERSION_MARKET).await?;
        Ok(ConversionRate::new(quote.price, quote.observed_at))
    }

    async fn fetch_fiat_reference_rate(&self) -> Result<ConversionRate, SourceError> {
        self.fiat.fetch_usd_krw().await
    }
}

/// Reject zero/negative prices so callers only ever see usable quotes
pub(crate) fn ensure_positive(
    source_name: &'static str,
    market: &str,
    price: Decimal,
) -> Result<Decimal, SourceError> {
    if price > Decimal::ZERO {
        Ok(price)
    } else {
        Err(SourceError::InvalidPrice {
            source_name,
            market: market.to_string(),
            price: price.to_string(),
        })
    }
}

/// Convert a JSON float into a decimal, rejecting NaN/inf
pub(crate) fn decimal_from_f64(
    source_name: &'static str,
    field: &str,
    value: f64,
) -> Result<Decimal, SourceError> {
    Decimal::try_from(value)
        .map(|d| d.normalize())
        .map_err(|e| SourceError::malformed(source_name, format!("{field}={value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ensure_positive_rejects_zero_and_negative() {
        assert_eq!(ensure_positive("upbit", "KRW-BTC", dec!(1)), Ok(dec!(1)));
        assert!(matches!(
            ensure_positive("upbit", "KRW-BTC", Decimal::ZERO),
            Err(SourceError::InvalidPrice { .. })
        ));
        assert!(matches!(
            ensure_positive("binance", "BTCUSDT", dec!(-3)),
            Err(SourceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_decimal_from_f64_rejects_nan() {
        assert_eq!(
            decimal_from_f64("upbit", "trade_price", 1372.5).unwrap(),
            dec!(1372.5)
        );
        assert!(decimal_from_f64("upbit", "trade_price", f64::NAN).is_err());
    }
}
