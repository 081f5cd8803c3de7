//! Oracle module - Cross-exchange price aggregation
//!
//! Pulls spot prices from a domestic (Upbit, KRW) and an international
//! (Binance, USDT) venue, converts them to a common currency through a cached
//! USDT/KRW rate and derives the premium between the two markets.

mod aggregator;
pub mod premium;
mod rate_cache;
pub mod sources;

pub use aggregator::{PremiumAggregator, DEFAULT_MAX_CONCURRENT_SYMBOLS};
pub use rate_cache::{RateCache, DEFAULT_STALENESS};
