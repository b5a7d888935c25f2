//! All data sources of the tracker behind one owned state object.

use eisbach_types::SurferEntry;
use time::{OffsetDateTime, UtcOffset};

use crate::context::SourceContext;
use crate::fetch::{CachePolicy, FetchOutcome};
use crate::history::local_offset;
use crate::messages::Locale;
use crate::surfers::{Readings, SurferLog};
use crate::temperature::WaterTemperatureMonitor;
use crate::water::WaterLevelMonitor;

/// Water level, temperature and surfer log sharing one [`SourceContext`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use eisbach_core::{CachePolicy, FileCache, HttpTransport, SourceContext, Tracker};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(HttpTransport::new("http://localhost:8080")?);
/// let ctx = SourceContext::new(transport)
///     .with_cache(Arc::new(FileCache::new(FileCache::default_dir())));
/// let tracker = Tracker::new(ctx);
///
/// tracker.water().refresh().await;
/// tracker.temperature().fetch(CachePolicy::Use).await;
/// tracker.add_surfer_entry(4, None, Default::default()).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Tracker {
    water: WaterLevelMonitor,
    temperature: WaterTemperatureMonitor,
    surfers: SurferLog,
}

impl Tracker {
    pub fn new(ctx: SourceContext) -> Self {
        Self::with_offset(ctx, local_offset())
    }

    /// Create a tracker using `offset` as the local timezone.
    pub fn with_offset(ctx: SourceContext, offset: UtcOffset) -> Self {
        Self {
            water: WaterLevelMonitor::with_offset(&ctx, offset),
            temperature: WaterTemperatureMonitor::new(&ctx),
            surfers: SurferLog::with_offset(&ctx, offset),
        }
    }

    /// Set the water-level alert threshold in cm.
    #[must_use]
    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.water = self.water.with_alert_threshold(threshold);
        self
    }

    pub fn water(&self) -> &WaterLevelMonitor {
        &self.water
    }

    pub fn temperature(&self) -> &WaterTemperatureMonitor {
        &self.temperature
    }

    pub fn surfers(&self) -> &SurferLog {
        &self.surfers
    }

    /// Most recent known readings.
    pub fn latest_readings(&self) -> Readings {
        let water = self.water.current();
        Readings {
            water_level: water.as_ref().and_then(|w| w.water_level),
            water_flow: water.as_ref().and_then(|w| w.water_flow),
            water_temperature: self.temperature.temperature(),
        }
    }

    /// Submit a surfer count; readings not given default to the latest known values.
    pub async fn add_surfer_entry(
        &self,
        count: u32,
        timestamp: Option<OffsetDateTime>,
        readings: Readings,
    ) -> FetchOutcome {
        let readings = readings.or(self.latest_readings());
        self.surfers.add_entry(count, timestamp, readings).await
    }

    /// Predict the surfer count; the temperature defaults to the latest known value.
    pub async fn predict(&self, hour: Option<u8>, water_temperature: Option<f64>) -> FetchOutcome {
        let water_temperature = water_temperature.or_else(|| self.temperature.temperature());
        self.surfers.predict(hour, water_temperature).await
    }

    /// Fetch current conditions, temperature and surfer entries concurrently.
    pub async fn refresh_all(&self) -> (FetchOutcome, FetchOutcome, FetchOutcome) {
        tokio::join!(
            self.water.refresh(),
            self.temperature.fetch(CachePolicy::Use),
            self.surfers.fetch_entries()
        )
    }

    /// Surfer entries currently held.
    pub fn surfer_entries(&self) -> Vec<SurferEntry> {
        self.surfers.entries().value().unwrap_or_default()
    }

    /// Switch every status message set to `locale`.
    pub fn set_locale(&self, locale: Locale) {
        self.water.set_locale(locale);
        self.temperature.set_locale(locale);
        self.surfers.set_locale(locale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::endpoints;
    use crate::clock::ManualClock;
    use crate::mock::{MockResponse, MockTransport};
    use std::sync::Arc;
    use time::macros::datetime;

    fn tracker() -> (Arc<MockTransport>, Tracker) {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(datetime!(2025-04-05 12:00 UTC)));
        let ctx = SourceContext::new(transport.clone()).with_clock(clock);
        (transport, Tracker::with_offset(ctx, UtcOffset::UTC))
    }

    #[tokio::test]
    async fn test_submission_defaults_to_latest_readings() {
        let (transport, tracker) = tracker();
        transport.on_get(
            endpoints::WATER_CONDITIONS,
            MockResponse::Body(
                r#"{"request_date":"x","water_level":151.0,"water_flow":24.5}"#.into(),
            ),
        );
        transport.on_get(
            endpoints::WATER_TEMPERATURE,
            MockResponse::Body(r#"{"water_temperature":8.0}"#.into()),
        );
        transport.on_post(endpoints::SURFERS, MockResponse::Body(String::new()));
        transport.on_get(endpoints::SURFERS, MockResponse::Body("[]".into()));

        let (water, temperature, surfers) = tracker.refresh_all().await;
        assert!(water.is_success() && temperature.is_success() && surfers.is_success());

        let own = Readings {
            water_flow: Some(30.0),
            ..Readings::default()
        };
        tracker.add_surfer_entry(2, None, own).await;

        let body = &transport.posted_bodies(endpoints::SURFERS)[0];
        assert_eq!(body["water_level"], 151.0);
        assert_eq!(body["water_flow"], 30.0);
        assert_eq!(body["water_temperature"], 8.0);
    }

    #[tokio::test]
    async fn test_predict_uses_known_temperature() {
        let (transport, tracker) = tracker();
        transport.on_get(
            endpoints::WATER_TEMPERATURE,
            MockResponse::Body(r#"{"water_temperature":8.0}"#.into()),
        );
        transport.on_get(
            endpoints::PREDICT,
            MockResponse::Body(r#"{"hour":12,"prediction":4}"#.into()),
        );

        tracker.predict(None, None).await;
        tracker.temperature().fetch(CachePolicy::Use).await;
        tracker.predict(None, None).await;

        let queries: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|c| c.path == endpoints::PREDICT)
            .map(|c| c.query)
            .collect();
        assert_eq!(queries[0].len(), 1);
        assert_eq!(
            queries[1][1],
            ("water_temperature".to_string(), "8".to_string())
        );
    }
}
