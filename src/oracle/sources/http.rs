//! Shared reqwest plumbing for the REST sources

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::SourceError;

const USER_AGENT: &str = concat!("premiumbot/", env!("CARGO_PKG_VERSION"));

/// Build a client whose every request is bounded by `timeout`
pub(crate) fn build_client(
    source_name: &'static str,
    timeout: Duration,
) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::transport(source_name, e.to_string()))
}

/// GET `url` with `query` and decode the JSON body.
///
/// Timeouts, non-2xx statuses and undecodable bodies each map to their own
/// `SourceError` variant.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    source_name: &'static str,
    timeout: Duration,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, SourceError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| classify(source_name, timeout, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            source_name,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify(source_name, timeout, e))?;

    serde_json::from_str(&body).map_err(|e| SourceError::malformed(source_name, e.to_string()))
}

fn classify(source_name: &'static str, timeout: Duration, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            source_name,
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        SourceError::transport(source_name, err.to_string())
    }
}
