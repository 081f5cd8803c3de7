//! Binance REST ticker client (international venue, USDT markets)
//!
//! `GET /api/v3/ticker/price?symbol=BTCUSDT` returns `{"symbol","price"}`
//! with the price encoded as a string.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use super::http::{build_client, get_json};
use super::{ensure_positive, QuoteSource};
use crate::error::SourceError;
use crate::types::{Quote, Venue};

const SOURCE: &str = "binance";

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BinanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(SOURCE, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.base_url)
    }
}

fn parse_ticker(market: &str, ticker: TickerPrice) -> Result<Quote, SourceError> {
    if !ticker.symbol.eq_ignore_ascii_case(market) {
        return Err(SourceError::empty(SOURCE, market));
    }

    let price = Decimal::from_str(ticker.price.trim())
        .map_err(|e| SourceError::malformed(SOURCE, format!("price={:?}: {e}", ticker.price)))?;
    let price = ensure_positive(SOURCE, market, price.normalize())?;

    // No trade time in this endpoint; stamp on receipt
    Ok(Quote::new(Venue::Binance, ticker.symbol, price, Utc::now()))
}

#[async_trait]
impl QuoteSource for BinanceClient {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    async fn fetch_price(&self, market: &str) -> Result<Quote, SourceError> {
        let ticker: TickerPrice = get_json(
            &self.client,
            SOURCE,
            self.timeout,
            &self.ticker_url(),
            &[("symbol", market)],
        )
        .await?;

        let quote = parse_ticker(market, ticker)?;
        tracing::debug!(source = %"Binance", market = %quote.market, price = %quote.price, "Ticker");
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decode(body: &str) -> TickerPrice {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_parse_ticker_string_price() {
        let quote = parse_ticker(
            "BTCUSDT",
            decode(r#"{"symbol":"BTCUSDT","price":"67250.01000000"}"#),
        )
        .unwrap();
        assert_eq!(quote.price, dec!(67250.01));
        assert_eq!(quote.market, "BTCUSDT");
        assert_eq!(quote.venue, Venue::Binance);
    }

    #[test]
    fn test_parse_ticker_rejects_garbage_price() {
        let err = parse_ticker(
            "BTCUSDT",
            decode(r#"{"symbol":"BTCUSDT","price":"n/a"}"#),
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Malformed { source_name: "binance", .. }));
    }

    #[test]
    fn test_parse_ticker_rejects_zero_price() {
        let err = parse_ticker(
            "ETHUSDT",
            decode(r#"{"symbol":"ETHUSDT","price":"0.00000000"}"#),
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::InvalidPrice { .. }));
    }

    #[test]
    fn test_parse_ticker_mismatched_symbol() {
        let err = parse_ticker(
            "XRPUSDT",
            decode(r#"{"symbol":"BTCUSDT","price":"1.0"}"#),
        )
        .unwrap_err();
        assert_eq!(err, SourceError::empty("binance", "XRPUSDT"));
    }

    #[test]
    fn test_invalid_symbol_body_does_not_decode() {
        let body = r#"{"code":-1121,"msg":"Invalid symbol."}"#;
        assert!(serde_json::from_str::<TickerPrice>(body).is_err());
    }
}
