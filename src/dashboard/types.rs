//! Dashboard API Types
//!
//! Response envelope and presentation helpers for the REST surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::oracle::premium::round_for_display;
use crate::types::{ConversionRate, PremiumResult, RateOverview};

/// Decimal places shown for premium percentages
pub const DISPLAY_DP: u32 = 2;

/// Uniform envelope for every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// `?symbols=BTC,ETH`
#[derive(Debug, Deserialize)]
pub struct SymbolsQuery {
    pub symbols: Option<String>,
}

impl SymbolsQuery {
    pub const DEFAULT: &'static str = "BTC";

    pub fn symbols_or_default(&self) -> &str {
        self.symbols
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(Self::DEFAULT)
    }
}

/// How far USDT trades above USD in KRW, with both rates
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsdtPremiumView {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub usdt_premium: Option<Decimal>,
    pub usdt_rate: ConversionRate,
    pub usd_rate: Option<ConversionRate>,
}

impl From<RateOverview> for UsdtPremiumView {
    fn from(overview: RateOverview) -> Self {
        Self {
            usdt_premium: overview
                .rate_premium_percent
                .map(|p| round_for_display(p, DISPLAY_DP)),
            usdt_rate: overview.conversion_rate,
            usd_rate: overview.fiat_rate,
        }
    }
}

/// Round the premium for display; every other figure is passed through
pub fn premium_view(mut result: PremiumResult) -> PremiumResult {
    result.premium_percent = result
        .premium_percent
        .map(|p| round_for_display(p, DISPLAY_DP));
    result
}
