//! Water temperature, cached locally for an hour.
//!
//! The temperature comes from a slow scraping pipeline on the backend, so a
//! fetched value is persisted and served from the cache while it is younger
//! than [`TEMPERATURE_TTL`].

use std::time::Duration;

use eisbach_types::WaterTemperature;

use crate::client::{decode, endpoints};
use crate::context::SourceContext;
use crate::error::Result;
use crate::fetch::{CachePolicy, DataSource, FetchOutcome, SourceConfig};
use crate::messages::{Locale, MessageSet};

/// Freshness window of a cached temperature.
pub const TEMPERATURE_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache key of the water temperature.
pub const TEMPERATURE_CACHE_KEY: &str = "eisbach.water_temperature";

fn decode_temperature(body: &str) -> Result<f64> {
    decode::<WaterTemperature>(body).map(|t| t.water_temperature)
}

/// Cached water temperature source.
#[derive(Debug)]
pub struct WaterTemperatureMonitor {
    source: DataSource<f64>,
}

impl WaterTemperatureMonitor {
    pub fn new(ctx: &SourceContext) -> Self {
        Self::with_endpoint(ctx, endpoints::WATER_TEMPERATURE)
    }

    /// Read the temperature from `endpoint`, e.g. the
    /// [`WATER_TEMPERATURE_ALIAS`](endpoints::WATER_TEMPERATURE_ALIAS) path.
    pub fn with_endpoint(ctx: &SourceContext, endpoint: &str) -> Self {
        let config = SourceConfig::new("water temperature", endpoint)
            .cached(TEMPERATURE_CACHE_KEY, TEMPERATURE_TTL)
            .messages(
                MessageSet::WaterTemperature.messages(ctx.locale),
                MessageSet::WaterTemperature.interval(),
            );
        Self {
            source: ctx.source(config).with_decoder(decode_temperature),
        }
    }

    pub fn source(&self) -> &DataSource<f64> {
        &self.source
    }

    /// Fetch the temperature, serving a fresh cached value when allowed.
    pub async fn fetch(&self, policy: CachePolicy) -> FetchOutcome {
        self.source.fetch(&[], policy).await
    }

    /// Last known temperature in °C.
    pub fn temperature(&self) -> Option<f64> {
        self.source.value()
    }

    pub fn set_locale(&self, locale: Locale) {
        self.source
            .status()
            .set_messages(MessageSet::WaterTemperature.messages(locale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, CachedValue, FileCache, MemoryCache, read_cached};
    use crate::clock::{Clock, ManualClock};
    use crate::mock::{MockResponse, MockTransport};
    use std::sync::Arc;
    use time::macros::datetime;

    fn body(t: f64) -> MockResponse {
        MockResponse::json(&WaterTemperature {
            water_temperature: t,
        })
    }

    #[tokio::test]
    async fn test_fetch_writes_cache() {
        let transport = Arc::new(MockTransport::new());
        let cache = Arc::new(MemoryCache::new());
        let clock = Arc::new(ManualClock::new(datetime!(2025-04-05 12:00 UTC)));
        transport.on_get(endpoints::WATER_TEMPERATURE, body(7.1));
        let ctx = SourceContext::new(transport.clone())
            .with_cache(cache.clone())
            .with_clock(clock.clone());
        let monitor = WaterTemperatureMonitor::new(&ctx);

        assert_eq!(monitor.fetch(CachePolicy::Use).await, FetchOutcome::Fresh);
        assert_eq!(monitor.temperature(), Some(7.1));

        let entry: CachedValue<f64> = read_cached(cache.as_ref(), TEMPERATURE_CACHE_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(entry, CachedValue::new(7.1, clock.now_millis()));
    }

    #[tokio::test]
    async fn test_legacy_cache_entry_is_served() {
        let transport = Arc::new(MockTransport::new());
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCache::new(dir.path()));
        let clock = Arc::new(ManualClock::new(datetime!(2025-04-05 12:00 UTC)));
        let written = clock.now_millis() - 30 * 60 * 1000;
        cache
            .store(
                TEMPERATURE_CACHE_KEY,
                &format!(r#"{{"temperature":9.4,"timestamp":{written}}}"#),
            )
            .unwrap();

        let ctx = SourceContext::new(transport.clone())
            .with_cache(cache)
            .with_clock(clock);
        let monitor = WaterTemperatureMonitor::new(&ctx);

        assert_eq!(monitor.fetch(CachePolicy::Use).await, FetchOutcome::Cached);
        assert_eq!(monitor.temperature(), Some(9.4));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_alias_endpoint_and_exporter_shape() {
        let transport = Arc::new(MockTransport::new());
        transport.on_get(
            endpoints::WATER_TEMPERATURE_ALIAS,
            MockResponse::Body(r#"{"temperature":"ignored","water_temperature":5.5}"#.into()),
        );
        let ctx = SourceContext::new(transport.clone());
        let monitor = WaterTemperatureMonitor::with_endpoint(&ctx, endpoints::WATER_TEMPERATURE_ALIAS);

        // Both keys at once is a duplicate field.
        assert_eq!(monitor.fetch(CachePolicy::Use).await, FetchOutcome::Failed);

        transport.on_get(
            endpoints::WATER_TEMPERATURE_ALIAS,
            MockResponse::Body(r#"{"temperature":5.5}"#.into()),
        );
        assert_eq!(monitor.fetch(CachePolicy::Use).await, FetchOutcome::Fresh);
        assert_eq!(monitor.temperature(), Some(5.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_messages_rotate_every_three_seconds() {
        let transport = Arc::new(MockTransport::new());
        transport.on_get(
            endpoints::WATER_TEMPERATURE,
            body(7.1).after(Duration::from_secs(10)),
        );
        let monitor = Arc::new(WaterTemperatureMonitor::new(&SourceContext::new(transport)));
        let messages = MessageSet::WaterTemperature.messages(Locale::En);

        let task = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.fetch(CachePolicy::Use).await })
        };
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(monitor.source().status().message(), messages[1]);

        monitor.set_locale(Locale::Es);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(
            monitor.source().status().message(),
            MessageSet::WaterTemperature.messages(Locale::Es)[1]
        );

        assert_eq!(task.await.unwrap(), FetchOutcome::Fresh);
        assert!(!monitor.source().status().is_running());
    }
}
