//! Upbit REST ticker client (domestic venue, KRW markets)
//!
//! `GET /v1/ticker?markets=KRW-BTC` returns a JSON array with one ticker per
//! requested market.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::http::{build_client, get_json};
use super::{decimal_from_f64, ensure_positive, QuoteSource};
use crate::error::SourceError;
use crate::types::{Quote, Venue};

const SOURCE: &str = "upbit";

#[derive(Debug, Deserialize)]
struct UpbitTicker {
    market: String,
    trade_price: f64,
    #[serde(default)]
    trade_timestamp: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl UpbitClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(SOURCE, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn ticker_url(&self) -> String {
        format!("{}/v1/ticker", self.base_url)
    }
}

/// Pick the ticker for `market` out of an Upbit ticker array
fn parse_ticker(market: &str, tickers: Vec<UpbitTicker>) -> Result<Quote, SourceError> {
    let ticker = tickers
        .into_iter()
        .find(|t| t.market.eq_ignore_ascii_case(market))
        .ok_or_else(|| SourceError::empty(SOURCE, market))?;

    let price = decimal_from_f64(SOURCE, "trade_price", ticker.trade_price)?;
    let price = ensure_positive(SOURCE, market, price)?;

    let observed_at = ticker
        .trade_timestamp
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    Ok(Quote::new(Venue::Upbit, ticker.market, price, observed_at))
}

#[async_trait]
impl QuoteSource for UpbitClient {
    fn venue(&self) -> Venue {
        Venue::Upbit
    }

    async fn fetch_price(&self, market: &str) -> Result<Quote, SourceError> {
        let tickers: Vec<UpbitTicker> = get_json(
            &self.client,
            SOURCE,
            self.timeout,
            &self.ticker_url(),
            &[("markets", market)],
        )
        .await?;

        let quote = parse_ticker(market, tickers)?;
        tracing::debug!(source = %"Upbit", market = %quote.market, price = %quote.price, "Ticker");
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decode(body: &str) -> Vec<UpbitTicker> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_parse_ticker_reads_trade_price() {
        let tickers = decode(
            r#"[{"market":"KRW-BTC","trade_price":95123000.0,"trade_timestamp":1700000000000,
                "change":"RISE","acc_trade_volume_24h":1234.5}]"#,
        );
        let quote = parse_ticker("KRW-BTC", tickers).unwrap();
        assert_eq!(quote.price, dec!(95123000));
        assert_eq!(quote.venue, Venue::Upbit);
        assert_eq!(quote.observed_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_ticker_usdt_rate_keeps_fraction() {
        let tickers = decode(r#"[{"market":"KRW-USDT","trade_price":1382.5}]"#);
        let quote = parse_ticker("KRW-USDT", tickers).unwrap();
        assert_eq!(quote.price, dec!(1382.5));
    }

    #[test]
    fn test_parse_ticker_empty_array() {
        let err = parse_ticker("KRW-BTC", decode("[]")).unwrap_err();
        assert_eq!(err, SourceError::empty("upbit", "KRW-BTC"));
    }

    #[test]
    fn test_parse_ticker_rejects_zero_price() {
        let tickers = decode(r#"[{"market":"KRW-BTC","trade_price":0.0}]"#);
        assert!(matches!(
            parse_ticker("KRW-BTC", tickers),
            Err(SourceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_error_body_is_not_a_ticker_array() {
        let body = r#"{"error":{"name":"404","message":"Code not found"}}"#;
        assert!(serde_json::from_str::<Vec<UpbitTicker>>(body).is_err());
    }
}
