//! Crowd-sourced surfer counts and predictions.

use std::sync::Arc;

use eisbach_types::{NewSurferEntry, PredictionResponse, SurferEntry};
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use crate::client::{Transport, endpoints};
use crate::clock::Clock;
use crate::context::SourceContext;
use crate::fetch::{CachePolicy, DataSource, FetchOutcome, SourceConfig};
use crate::history::local_offset;
use crate::messages::{Locale, MessageSet};

/// Conditions recorded alongside a surfer count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub water_level: Option<f64>,
    pub water_flow: Option<f64>,
    pub water_temperature: Option<f64>,
}

impl Readings {
    /// Fill missing readings from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Readings) -> Readings {
        Readings {
            water_level: self.water_level.or(fallback.water_level),
            water_flow: self.water_flow.or(fallback.water_flow),
            water_temperature: self.water_temperature.or(fallback.water_temperature),
        }
    }
}

/// Surfer entry list, submissions and predictions.
pub struct SurferLog {
    entries: DataSource<Vec<SurferEntry>>,
    prediction: DataSource<PredictionResponse>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    offset: UtcOffset,
}

impl std::fmt::Debug for SurferLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurferLog")
            .field("entries", &self.entries)
            .field("prediction", &self.prediction)
            .finish()
    }
}

impl SurferLog {
    pub fn new(ctx: &SourceContext) -> Self {
        Self::with_offset(ctx, local_offset())
    }

    /// Create a log using `offset` for the default prediction hour.
    pub fn with_offset(ctx: &SourceContext, offset: UtcOffset) -> Self {
        let entries = ctx.source(SourceConfig::new("surfer entries", endpoints::SURFERS).messages(
            MessageSet::Surfers.messages(ctx.locale),
            MessageSet::Surfers.interval(),
        ));
        let prediction = ctx.source(SourceConfig::new("prediction", endpoints::PREDICT).messages(
            MessageSet::Prediction.messages(ctx.locale),
            MessageSet::Prediction.interval(),
        ));
        Self {
            entries,
            prediction,
            transport: Arc::clone(&ctx.transport),
            clock: Arc::clone(&ctx.clock),
            offset,
        }
    }

    pub fn entries(&self) -> &DataSource<Vec<SurferEntry>> {
        &self.entries
    }

    pub fn prediction(&self) -> &DataSource<PredictionResponse> {
        &self.prediction
    }

    /// Fetch all entries.
    pub async fn fetch_entries(&self) -> FetchOutcome {
        self.entries.fetch(&[], CachePolicy::Bypass).await
    }

    /// Submit a count, then re-fetch the entry list.
    ///
    /// `timestamp` defaults to now. A failed submission is recorded in the
    /// entries state and the list is left untouched.
    pub async fn add_entry(
        &self,
        count: u32,
        timestamp: Option<OffsetDateTime>,
        readings: Readings,
    ) -> FetchOutcome {
        let entry = NewSurferEntry {
            count,
            timestamp: timestamp.unwrap_or_else(|| self.clock.now()),
            water_level: readings.water_level,
            water_flow: readings.water_flow,
            water_temperature: readings.water_temperature,
        };

        let body = match serde_json::to_value(&entry) {
            Ok(body) => body,
            Err(e) => {
                self.entries
                    .record_error(format!("Failed to submit entry: {e}"));
                return FetchOutcome::Failed;
            }
        };

        if let Err(e) = self.transport.post_json(endpoints::SURFERS, &body).await {
            warn!(error = %e, count, "Failed to add surfer entry");
            self.entries
                .record_error(format!("Failed to add entry: {e}"));
            return FetchOutcome::Failed;
        }
        info!(count, "Added surfer entry");

        self.fetch_entries().await
    }

    /// Ask the backend for a prediction.
    ///
    /// `hour` defaults to the current local hour. Hours outside 0-23 are
    /// rejected without a request.
    pub async fn predict(&self, hour: Option<u8>, water_temperature: Option<f64>) -> FetchOutcome {
        let hour = hour.unwrap_or_else(|| self.clock.now().to_offset(self.offset).hour());
        if hour > 23 {
            self.prediction
                .record_error(format!("Invalid hour {hour}: expected 0-23"));
            return FetchOutcome::Failed;
        }

        let mut query = vec![("hour".to_string(), hour.to_string())];
        if let Some(t) = water_temperature {
            query.push(("water_temperature".to_string(), t.to_string()));
        }
        self.prediction.fetch(&query, CachePolicy::Bypass).await
    }

    pub fn set_locale(&self, locale: Locale) {
        self.entries
            .status()
            .set_messages(MessageSet::Surfers.messages(locale));
        self.prediction
            .status()
            .set_messages(MessageSet::Prediction.messages(locale));
    }
}
