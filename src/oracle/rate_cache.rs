//! Conversion-rate cache
//!
//! Serves the USDT/KRW rate with a staleness window. A stale read performs at
//! most one upstream fetch; on failure the previous value (or the configured
//! default) keeps being served. Concurrent stale readers queue behind a single
//! refresh instead of each hitting the venue.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::sources::ReferenceRateSource;
use crate::error::SourceError;
use crate::types::ConversionRate;

/// Default staleness window
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Slot {
    rate: ConversionRate,
    /// Last successful refresh; `None` means stale
    refreshed_at: Option<Instant>,
}

impl Slot {
    fn is_fresh(&self, staleness: Duration) -> bool {
        self.refreshed_at
            .map(|at| at.elapsed() < staleness)
            .unwrap_or(false)
    }
}

pub struct RateCache {
    source: Arc<dyn ReferenceRateSource>,
    staleness: Duration,
    slot: RwLock<Slot>,
    /// Held across check, fetch and store
    refresh_gate: Mutex<()>,
}

impl RateCache {
    /// Create a stale cache serving `default_rate` until the first successful fetch
    pub fn new(
        source: Arc<dyn ReferenceRateSource>,
        default_rate: Decimal,
        staleness: Duration,
    ) -> Self {
        Self {
            source,
            staleness,
            slot: RwLock::new(Slot {
                rate: ConversionRate::new(default_rate, Utc::now()),
                refreshed_at: None,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current rate. Never fails: a failed refresh serves the last known value.
    pub async fn get_rate(&self) -> ConversionRate {
        {
            let slot = self.slot.read().await;
            if slot.is_fresh(self.staleness) {
                return slot.rate;
            }
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited
        {
            let slot = self.slot.read().await;
            if slot.is_fresh(self.staleness) {
                return slot.rate;
            }
        }

        self.refresh_locked().await
    }

    /// Mark the cache stale and fetch once, returning whatever value is in
    /// effect afterwards.
    pub async fn force_refresh(&self) -> ConversionRate {
        let _gate = self.refresh_gate.lock().await;
        self.slot.write().await.refreshed_at = None;
        tracing::info!("Conversion rate refresh forced");
        self.refresh_locked().await
    }

    /// Cached value without any I/O
    pub async fn cached(&self) -> ConversionRate {
        self.slot.read().await.rate
    }

    pub async fn is_fresh(&self) -> bool {
        self.slot.read().await.is_fresh(self.staleness)
    }

    /// Time since the last successful refresh, `None` if there never was one
    pub async fn age(&self) -> Option<Duration> {
        self.slot.read().await.refreshed_at.map(|at| at.elapsed())
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Caller must hold `refresh_gate`
    async fn refresh_locked(&self) -> ConversionRate {
        match self.fetch_valid().await {
            Ok(fresh) => {
                let mut slot = self.slot.write().await;
                let previous = slot.rate.rate;
                slot.rate = fresh;
                slot.refreshed_at = Some(Instant::now());
                tracing::info!(
                    rate = %fresh.rate,
                    previous = %previous,
                    "Conversion rate refreshed"
                );
                fresh
            }
            Err(e) => {
                let slot = self.slot.read().await;
                tracing::warn!(
                    error = %e,
                    serving = %slot.rate.rate,
                    "Conversion rate refresh failed, serving last known value"
                );
                slot.rate
            }
        }
    }

    async fn fetch_valid(&self) -> Result<ConversionRate, SourceError> {
        let fetched = self.source.fetch_conversion_rate().await?;
        if fetched.rate <= Decimal::ZERO {
            return Err(SourceError::InvalidPrice {
                source_name: "conversion-rate",
                market: "USDT/KRW".to_string(),
                price: fetched.rate.to_string(),
            });
        }
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::{mock, Sequence};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Rates {}

        #[async_trait]
        impl ReferenceRateSource for Rates {
            async fn fetch_conversion_rate(&self) -> Result<ConversionRate, SourceError>;
            async fn fetch_fiat_reference_rate(&self) -> Result<ConversionRate, SourceError>;
        }
    }

    fn rate(value: Decimal) -> ConversionRate {
        ConversionRate::new(value, Utc::now())
    }

    fn outage() -> SourceError {
        SourceError::Timeout {
            source_name: "upbit",
            timeout_ms: 5000,
        }
    }

    fn cache_with(mock: MockRates) -> RateCache {
        RateCache::new(Arc::new(mock), dec!(1350), DEFAULT_STALENESS)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_read_within_window_is_served_from_cache() {
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .returning(|| Ok(rate(dec!(1382.5))));

        let cache = cache_with(mock);
        let first = cache.get_rate().await;
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_rate().await;

        assert_eq!(first, second);
        assert_eq!(second.rate, dec!(1382.5));
        assert!(cache.is_fresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_serves_previous_value_and_stays_stale() {
        let mut seq = Sequence::new();
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(rate(dec!(1350))));
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(outage()));

        let cache = RateCache::new(Arc::new(mock), dec!(1000), DEFAULT_STALENESS);
        assert_eq!(cache.get_rate().await.rate, dec!(1350));

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(!cache.is_fresh().await);

        assert_eq!(cache.get_rate().await.rate, dec!(1350));
        assert!(!cache.is_fresh().await);
    }

    #[tokio::test]
    async fn test_never_fetched_serves_default() {
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .returning(|| Err(outage()));

        let cache = cache_with(mock);
        assert_eq!(cache.get_rate().await.rate, dec!(1350));
        assert_eq!(cache.age().await, None);
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_rejected() {
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .returning(|| Ok(rate(Decimal::ZERO)));

        let cache = cache_with(mock);
        assert_eq!(cache.get_rate().await.rate, dec!(1350));
        assert!(!cache.is_fresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_fetches_inside_window() {
        let mut seq = Sequence::new();
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(rate(dec!(1380))));
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(rate(dec!(1391))));

        let cache = cache_with(mock);
        cache.get_rate().await;
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cache.force_refresh().await.rate, dec!(1391));
        assert_eq!(cache.cached().await.rate, dec!(1391));
        assert_eq!(cache.age().await, Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_force_refresh_leaves_cache_stale() {
        let mut seq = Sequence::new();
        let mut mock = MockRates::new();
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(rate(dec!(1380))));
        mock.expect_fetch_conversion_rate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(outage()));

        let cache = cache_with(mock);
        cache.get_rate().await;

        assert_eq!(cache.force_refresh().await.rate, dec!(1380));
        assert!(!cache.is_fresh().await);
    }

    struct SlowRates {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReferenceRateSource for SlowRates {
        async fn fetch_conversion_rate(&self) -> Result<ConversionRate, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(rate(dec!(1377)))
        }

        async fn fetch_fiat_reference_rate(&self) -> Result<ConversionRate, SourceError> {
            Err(outage())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_stale_reads_share_one_fetch() {
        let source = Arc::new(SlowRates {
            calls: AtomicUsize::new(0),
        });
        let cache = RateCache::new(source.clone(), dec!(1350), DEFAULT_STALENESS);

        let (a, b, c) = tokio::join!(cache.get_rate(), cache.get_rate(), cache.get_rate());

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.rate, dec!(1377));
        assert_eq!(b, a);
        assert_eq!(c, a);
    }
}
