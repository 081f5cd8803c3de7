//! open.er-api.com client for the USD/KRW fiat benchmark

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::http::{build_client, get_json};
use super::{decimal_from_f64, ensure_positive};
use crate::error::SourceError;
use crate::types::ConversionRate;

const SOURCE: &str = "open.er-api";
const TARGET_CURRENCY: &str = "KRW";

#[derive(Debug, Deserialize)]
struct LatestRates {
    result: String,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct FiatRateClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl FiatRateClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(SOURCE, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Latest USD price in KRW
    pub async fn fetch_usd_krw(&self) -> Result<ConversionRate, SourceError> {
        let url = format!("{}/v6/latest/USD", self.base_url);
        let body: LatestRates = get_json(&self.client, SOURCE, self.timeout, &url, &[]).await?;
        let rate = parse_rates(body)?;
        tracing::debug!(source = %SOURCE, rate = %rate.rate, "USD/KRW");
        Ok(rate)
    }
}

fn parse_rates(body: LatestRates) -> Result<ConversionRate, SourceError> {
    if body.result != "success" {
        return Err(SourceError::malformed(
            SOURCE,
            format!("result={}", body.result),
        ));
    }

    let raw = body
        .rates
        .get(TARGET_CURRENCY)
        .copied()
        .ok_or_else(|| SourceError::malformed(SOURCE, "missing KRW rate"))?;

    let rate = decimal_from_f64(SOURCE, TARGET_CURRENCY, raw)?;
    let rate = ensure_positive(SOURCE, "USD/KRW", rate)?;

    let observed_at = body
        .time_last_update_unix
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    Ok(ConversionRate::new(rate, observed_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn decode(body: &str) -> LatestRates {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_parse_rates_reads_krw() {
        let rate = parse_rates(decode(
            r#"{"result":"success","base_code":"USD","time_last_update_unix":1700000000,
                "rates":{"USD":1,"KRW":1362.45,"JPY":149.8}}"#,
        ))
        .unwrap();
        assert_eq!(rate.rate, dec!(1362.45));
        assert_eq!(rate.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_rates_missing_krw_is_malformed() {
        let err = parse_rates(decode(r#"{"result":"success","rates":{"USD":1}}"#)).unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rates_error_result() {
        let err = parse_rates(decode(
            r#"{"result":"error","error-type":"unsupported-code"}"#,
        ))
        .unwrap_err();
        assert_eq!(err, SourceError::malformed("open.er-api", "result=error"));
    }
}
