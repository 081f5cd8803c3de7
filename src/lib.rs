//! PremiumBot Library
//!
//! Cross-exchange premium monitor: Upbit KRW prices against Binance USDT
//! prices, normalised through a cached USDT/KRW conversion rate.

pub mod config;
pub mod error;
pub mod logging;
pub mod oracle;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use error::{SourceError, ValidationError};
pub use oracle::{PremiumAggregator, RateCache};
pub use types::{ConversionRate, HealthReport, PremiumResult, Quote, RateOverview, Symbol, Venue};
