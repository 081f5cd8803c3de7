//! Error types for the price aggregation core
//!
//! `SourceError` covers every way an upstream ticker/rate call can fail. It is
//! always recoverable: callers degrade a single result or fall back to a
//! cached value. `ValidationError` is raised for malformed input before any
//! network call is attempted.

use thiserror::Error;

/// Upstream source failure (network, timeout, HTTP status, malformed or empty body)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{source_name} request timed out after {timeout_ms}ms")]
    Timeout {
        source_name: &'static str,
        timeout_ms: u64,
    },

    #[error("{source_name} transport error: {message}")]
    Transport {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} returned HTTP {status}")]
    HttpStatus {
        source_name: &'static str,
        status: u16,
    },

    #[error("{source_name} response could not be parsed: {message}")]
    Malformed {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} returned no ticker for {market}")]
    EmptyResult {
        source_name: &'static str,
        market: String,
    },

    #[error("{source_name} returned non-positive price {price} for {market}")]
    InvalidPrice {
        source_name: &'static str,
        market: String,
        price: String,
    },
}

impl SourceError {
    pub fn transport(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            source_name,
            message: message.into(),
        }
    }

    pub fn malformed(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name,
            message: message.into(),
        }
    }

    pub fn empty(source_name: &'static str, market: impl Into<String>) -> Self {
        Self::EmptyResult {
            source_name,
            market: market.into(),
        }
    }

    /// Name of the upstream that failed
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Timeout { source_name, .. }
            | Self::Transport { source_name, .. }
            | Self::HttpStatus { source_name, .. }
            | Self::Malformed { source_name, .. }
            | Self::EmptyResult { source_name, .. }
            | Self::InvalidPrice { source_name, .. } => source_name,
        }
    }
}

/// Input rejected before reaching any source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("symbol list cannot be empty")]
    EmptySymbolList,
    #[error("symbol list has {count} entries, max {max}")]
    TooManySymbols { count: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_messages_name_the_source() {
        let err = SourceError::Timeout {
            source_name: "binance",
            timeout_ms: 5000,
        };
        assert_eq!(err.to_string(), "binance request timed out after 5000ms");
        assert_eq!(err.source_name(), "binance");

        let err = SourceError::empty("upbit", "KRW-FOO");
        assert_eq!(err.to_string(), "upbit returned no ticker for KRW-FOO");
    }
}
