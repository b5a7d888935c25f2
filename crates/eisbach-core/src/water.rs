//! Live water level, flow and history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use eisbach_types::{ChartSeries, HistoricalWaterLevel, WaterConditions};
use time::UtcOffset;
use tracing::{info, warn};

use crate::client::endpoints;
use crate::clock::Clock;
use crate::context::SourceContext;
use crate::fetch::{CachePolicy, DataSource, FetchOutcome, SourceConfig};
use crate::history::{HistoryAggregator, ViewMode, local_offset};
use crate::messages::{Locale, MessageSet};

/// Water level in cm at or below which the wave is longboard-only.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 140.0;

/// Polls the current water conditions into a live window and loads the
/// water-level history once per session.
pub struct WaterLevelMonitor {
    conditions: DataSource<WaterConditions>,
    history: DataSource<Vec<HistoricalWaterLevel>>,
    aggregator: RwLock<HistoryAggregator>,
    clock: Arc<dyn Clock>,
    threshold: f64,
    alerting: AtomicBool,
}

impl std::fmt::Debug for WaterLevelMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaterLevelMonitor")
            .field("conditions", &self.conditions)
            .field("history", &self.history)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl WaterLevelMonitor {
    pub fn new(ctx: &SourceContext) -> Self {
        Self::with_offset(ctx, local_offset())
    }

    /// Create a monitor interpreting history timestamps in `offset`.
    pub fn with_offset(ctx: &SourceContext, offset: UtcOffset) -> Self {
        let conditions = ctx.source(
            SourceConfig::new("water level", endpoints::WATER_CONDITIONS).messages(
                MessageSet::WaterLevel.messages(ctx.locale),
                MessageSet::WaterLevel.interval(),
            ),
        );
        let history = ctx.source(
            SourceConfig::new("water level history", endpoints::WATER_HISTORY)
                .messages(
                    MessageSet::WaterHistory.messages(ctx.locale),
                    MessageSet::WaterHistory.interval(),
                )
                .fetch_once(true),
        );
        Self {
            conditions,
            history,
            aggregator: RwLock::new(HistoryAggregator::new(offset)),
            clock: Arc::clone(&ctx.clock),
            threshold: DEFAULT_ALERT_THRESHOLD,
            alerting: AtomicBool::new(false),
        }
    }

    /// Alert when the level is at or below `threshold` cm.
    #[must_use]
    pub fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn alert_threshold(&self) -> f64 {
        self.threshold
    }

    /// The current-conditions source.
    pub fn conditions(&self) -> &DataSource<WaterConditions> {
        &self.conditions
    }

    /// The history source.
    pub fn history(&self) -> &DataSource<Vec<HistoricalWaterLevel>> {
        &self.history
    }

    /// Most recent water conditions.
    pub fn current(&self) -> Option<WaterConditions> {
        self.conditions.value()
    }

    /// Fetch current conditions and append the level to the live window.
    pub async fn refresh(&self) -> FetchOutcome {
        let outcome = self.conditions.fetch(&[], CachePolicy::Bypass).await;
        if outcome != FetchOutcome::Fresh {
            return outcome;
        }

        let Some(level) = self.current().and_then(|c| c.water_level) else {
            return outcome;
        };
        if let Ok(mut aggregator) = self.aggregator.write() {
            aggregator.push_live(self.clock.now(), level);
        }

        let alert = level <= self.threshold;
        let was_alerting = self.alerting.swap(alert, Ordering::SeqCst);
        if alert && !was_alerting {
            warn!(
                level,
                threshold = self.threshold,
                "Water level is currently {level}cm, longboard only"
            );
        } else if !alert && was_alerting {
            info!(level, "Water level back above alert threshold");
        }
        outcome
    }

    /// Load the history once; later calls are no-ops.
    pub async fn load_history(&self) -> FetchOutcome {
        let outcome = self.history.fetch(&[], CachePolicy::Use).await;
        if outcome == FetchOutcome::Fresh
            && let Some(rows) = self.history.value()
            && let Ok(mut aggregator) = self.aggregator.write()
        {
            aggregator.load_history(&rows);
        }
        outcome
    }

    /// Chart series for `mode` as of now.
    pub fn chart(&self, mode: ViewMode) -> ChartSeries {
        self.aggregator
            .read()
            .map(|aggregator| aggregator.view(mode, self.clock.now()))
            .unwrap_or_default()
    }

    /// Number of live samples held.
    pub fn live_len(&self) -> usize {
        self.aggregator.read().map(|a| a.live_len()).unwrap_or(0)
    }

    /// Whether the current water level is at or below the alert threshold.
    pub fn alert(&self) -> bool {
        self.current()
            .and_then(|c| c.water_level)
            .is_some_and(|level| level <= self.threshold)
    }

    /// Switch status messages to `locale` without restarting running tickers.
    pub fn set_locale(&self, locale: Locale) {
        self.conditions
            .status()
            .set_messages(MessageSet::WaterLevel.messages(locale));
        self.history
            .status()
            .set_messages(MessageSet::WaterHistory.messages(locale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fetch::FetchStatus;
    use crate::mock::{MockResponse, MockTransport};
    use std::time::Duration;
    use time::macros::datetime;

    fn water(level: Option<f64>) -> MockResponse {
        MockResponse::json(&WaterConditions {
            request_date: "2025-04-05T12:00:00Z".into(),
            water_level: level,
            water_flow: Some(22.0),
        })
    }

    fn setup() -> (Arc<MockTransport>, Arc<ManualClock>, WaterLevelMonitor) {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(datetime!(2025-04-05 12:00 UTC)));
        let ctx = SourceContext::new(transport.clone()).with_clock(clock.clone());
        let monitor = WaterLevelMonitor::with_offset(&ctx, UtcOffset::UTC);
        (transport, clock, monitor)
    }

    #[tokio::test]
    async fn test_refresh_appends_live_sample() {
        let (transport, clock, monitor) = setup();
        transport.on_get(endpoints::WATER_CONDITIONS, water(Some(150.0)));

        for _ in 0..12 {
            assert_eq!(monitor.refresh().await, FetchOutcome::Fresh);
            clock.advance(Duration::from_secs(60));
        }
        assert_eq!(monitor.live_len(), 10);
        assert_eq!(transport.call_count(endpoints::WATER_CONDITIONS), 12);

        let chart = monitor.chart(ViewMode::Hourly);
        assert_eq!(chart.len(), 10);
        assert_eq!(chart.labels.first().map(String::as_str), Some("12:02:00"));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_live_window() {
        let (transport, _clock, monitor) = setup();
        transport.enqueue_get(endpoints::WATER_CONDITIONS, water(Some(150.0)));
        transport.enqueue_get(endpoints::WATER_CONDITIONS, MockResponse::Status(502));

        monitor.refresh().await;
        assert_eq!(monitor.refresh().await, FetchOutcome::Failed);
        assert_eq!(monitor.live_len(), 1);
        assert_eq!(monitor.conditions().state().status, FetchStatus::Error);
        assert_eq!(monitor.current().and_then(|c| c.water_level), Some(150.0));
    }

    #[tokio::test]
    async fn test_missing_level_is_not_charted() {
        let (transport, _clock, monitor) = setup();
        transport.on_get(endpoints::WATER_CONDITIONS, water(None));
        assert_eq!(monitor.refresh().await, FetchOutcome::Fresh);
        assert_eq!(monitor.live_len(), 0);
        assert!(!monitor.alert());
    }

    #[tokio::test]
    async fn test_alert_threshold() {
        let (transport, _clock, monitor) = setup();
        transport.enqueue_get(endpoints::WATER_CONDITIONS, water(Some(140.0)));
        transport.enqueue_get(endpoints::WATER_CONDITIONS, water(Some(140.5)));

        monitor.refresh().await;
        assert!(monitor.alert());
        monitor.refresh().await;
        assert!(!monitor.alert());

        let (transport, _clock, monitor) = setup();
        let monitor = monitor.with_alert_threshold(150.0);
        transport.on_get(endpoints::WATER_CONDITIONS, water(Some(145.0)));
        monitor.refresh().await;
        assert!(monitor.alert());
    }

    #[tokio::test]
    async fn test_history_loads_once() {
        let (transport, _clock, monitor) = setup();
        transport.on_get(
            endpoints::WATER_HISTORY,
            MockResponse::Body(
                r#"[
                    {"DateTime":"05.04.2025 08:00:00","Value":141},
                    {"DateTime":"broken","Value":1},
                    {"DateTime":"04.04.2025 08:00:00","Value":139}
                ]"#
                .into(),
            ),
        );

        assert_eq!(monitor.load_history().await, FetchOutcome::Fresh);
        assert_eq!(monitor.load_history().await, FetchOutcome::Skipped);
        assert_eq!(transport.call_count(endpoints::WATER_HISTORY), 1);

        let daily = monitor.chart(ViewMode::Daily);
        assert_eq!(daily.labels, vec!["04.04.2025", "05.04.2025"]);
        assert_eq!(daily.values, vec![139.0, 141.0]);

        let hourly = monitor.chart(ViewMode::Hourly);
        assert_eq!(hourly.labels, vec!["05.04.2025 08:00"]);
    }

    #[tokio::test]
    async fn test_set_locale_swaps_messages() {
        let (_transport, _clock, monitor) = setup();
        monitor.set_locale(Locale::Es);
        assert_eq!(
            monitor.conditions().status().message(),
            MessageSet::WaterLevel.messages(Locale::Es)[0]
        );
    }
}
