//! Core types used throughout PremiumBot
//!
//! Defines symbols, venues, quotes, conversion rates and the per-symbol
//! premium result handed to callers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;

const MAX_SYMBOL_LEN: usize = 10;

/// Upper bound on symbols accepted in one batch request
pub const MAX_SYMBOLS_PER_REQUEST: usize = 20;

/// Generic asset identifier (e.g. "BTC"), independent of any venue's market format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Parse a comma-separated symbol list ("BTC, eth,XRP").
///
/// Fails on the first malformed entry, or when the list exceeds
/// [`MAX_SYMBOLS_PER_REQUEST`], so that no network call is made for a request
/// that cannot be answered as asked.
pub fn parse_symbol_list(input: &str) -> Result<Vec<Symbol>, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::EmptySymbolList);
    }

    let count = input.split(',').count();
    if count > MAX_SYMBOLS_PER_REQUEST {
        return Err(ValidationError::TooManySymbols {
            count,
            max: MAX_SYMBOLS_PER_REQUEST,
        });
    }

    input.split(',').map(Symbol::parse).collect()
}

/// Trading venue identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// Domestic venue, KRW-quoted
    Upbit,
    /// International venue, USDT-quoted
    Binance,
}

impl Venue {
    pub fn name(&self) -> &'static str {
        match self {
            Venue::Upbit => "upbit",
            Venue::Binance => "binance",
        }
    }

    /// Currency the venue quotes prices in
    pub fn quote_currency(&self) -> &'static str {
        match self {
            Venue::Upbit => "KRW",
            Venue::Binance => "USDT",
        }
    }

    /// Translate a generic symbol into the venue's native market identifier
    /// (e.g. "KRW-BTC" on Upbit, "BTCUSDT" on Binance)
    pub fn market_code(&self, symbol: &Symbol) -> String {
        match self {
            Venue::Upbit => format!("{}-{}", self.quote_currency(), symbol),
            Venue::Binance => format!("{}{}", symbol, self.quote_currency()),
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Upbit => write!(f, "Upbit"),
            Venue::Binance => write!(f, "Binance"),
        }
    }
}

/// A single observed trade price from one venue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Venue-native market identifier the price was fetched for
    pub market: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub venue: Venue,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        venue: Venue,
        market: impl Into<String>,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            market: market.into(),
            price,
            venue,
            observed_at,
        }
    }
}

/// Price of the reference pegged asset (or fiat) in domestic currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionRate {
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl ConversionRate {
    pub fn new(rate: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self { rate, observed_at }
    }
}

/// Outcome of a premium computation for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "success"),
            ResultStatus::Error => write!(f, "error"),
        }
    }
}

/// Derived figures for a domestic/international price pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumBreakdown {
    pub international_price_in_domestic: Decimal,
    pub premium_percent: Decimal,
    pub price_difference: Decimal,
}

/// Per-symbol premium record. Error results carry no price fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PremiumResult {
    pub symbol: Symbol,
    pub domestic_venue: Venue,
    pub international_venue: Venue,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub domestic_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub international_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub conversion_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub international_price_in_domestic: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub premium_percent: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_difference: Option<Decimal>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PremiumResult {
    pub fn success(
        symbol: Symbol,
        domestic: &Quote,
        international: &Quote,
        conversion_rate: Decimal,
        breakdown: PremiumBreakdown,
    ) -> Self {
        Self {
            symbol,
            domestic_venue: domestic.venue,
            international_venue: international.venue,
            domestic_price: Some(domestic.price),
            international_price: Some(international.price),
            conversion_rate: Some(conversion_rate),
            international_price_in_domestic: Some(breakdown.international_price_in_domestic),
            premium_percent: Some(breakdown.premium_percent),
            price_difference: Some(breakdown.price_difference),
            status: ResultStatus::Success,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(
        symbol: Symbol,
        domestic_venue: Venue,
        international_venue: Venue,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            domestic_venue,
            international_venue,
            domestic_price: None,
            international_price: None,
            conversion_rate: None,
            international_price_in_domestic: None,
            premium_percent: None,
            price_difference: None,
            status: ResultStatus::Error,
            error: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Per-source connectivity snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub domestic_connected: bool,
    pub international_connected: bool,
    pub conversion_rate_connected: bool,
    pub all_connected: bool,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(domestic: bool, international: bool, conversion_rate: bool) -> Self {
        Self {
            domestic_connected: domestic,
            international_connected: international,
            conversion_rate_connected: conversion_rate,
            all_connected: domestic && international && conversion_rate,
            timestamp: Utc::now(),
        }
    }
}

/// Cached conversion rate alongside the fiat benchmark and their spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateOverview {
    pub conversion_rate: ConversionRate,
    /// False while the cache is Stale (never fetched, or last refresh failed)
    pub conversion_rate_fresh: bool,
    pub fiat_rate: Option<ConversionRate>,
    /// (conversion_rate / fiat_rate - 1) * 100
    #[serde(with = "rust_decimal::serde::float_option")]
    pub rate_premium_percent: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parse_normalizes() {
        let symbol = Symbol::parse(" btc ").unwrap();
        assert_eq!(symbol.as_str(), "BTC");
    }

    #[test]
    fn test_symbol_rejects_malformed_input() {
        assert_eq!(Symbol::parse("  "), Err(ValidationError::EmptySymbol));
        assert!(matches!(
            Symbol::parse("BTC-USD"),
            Err(ValidationError::SymbolInvalidChar { ch: '-', index: 3 })
        ));
        assert!(matches!(
            Symbol::parse("ABCDEFGHIJK"),
            Err(ValidationError::SymbolTooLong { len: 11, max: 10 })
        ));
    }

    #[test]
    fn test_parse_symbol_list_keeps_order() {
        let symbols = parse_symbol_list("btc, ETH,xrp").unwrap();
        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["BTC", "ETH", "XRP"]);
    }

    #[test]
    fn test_parse_symbol_list_rejects_blank_entry() {
        assert_eq!(
            parse_symbol_list("BTC,,ETH"),
            Err(ValidationError::EmptySymbol)
        );
    }

    #[test]
    fn test_parse_symbol_list_caps_batch_size() {
        let at_limit = vec!["BTC"; MAX_SYMBOLS_PER_REQUEST].join(",");
        assert_eq!(
            parse_symbol_list(&at_limit).unwrap().len(),
            MAX_SYMBOLS_PER_REQUEST
        );

        let over = vec!["BTC"; MAX_SYMBOLS_PER_REQUEST + 1].join(",");
        assert_eq!(
            parse_symbol_list(&over),
            Err(ValidationError::TooManySymbols {
                count: MAX_SYMBOLS_PER_REQUEST + 1,
                max: MAX_SYMBOLS_PER_REQUEST,
            })
        );
    }

    #[test]
    fn test_wire_names() {
        let symbol = Symbol::parse("eth").unwrap();
        assert_eq!(serde_json::to_string(&symbol).unwrap(), r#""ETH""#);
        assert_eq!(serde_json::to_string(&Venue::Upbit).unwrap(), r#""upbit""#);
        assert_eq!(
            serde_json::to_string(&ResultStatus::Error).unwrap(),
            r#""error""#
        );
    }

    #[test]
    fn test_venue_market_codes() {
        let btc = Symbol::parse("BTC").unwrap();
        assert_eq!(Venue::Upbit.market_code(&btc), "KRW-BTC");
        assert_eq!(Venue::Binance.market_code(&btc), "BTCUSDT");
    }

    #[test]
    fn test_health_report_aggregate_flag() {
        assert!(HealthReport::new(true, true, true).all_connected);
        assert!(!HealthReport::new(true, false, true).all_connected);
    }
}
