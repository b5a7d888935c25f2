//! Client-side data sources for the Eisbach river-condition tracker.
//!
//! This crate polls the tracker backend for live water conditions, the
//! water-level history, the water temperature and crowd-sourced surfer
//! counts, and keeps the results in observable state objects.
//!
//! # Features
//!
//! - **Request lifecycle**: every source moves through
//!   `idle → loading → success | error` and keeps its last good value
//! - **Rotating status messages**: a status line cycles while a request is in flight
//! - **Local caching**: results can be persisted with a time-to-live
//! - **Chart aggregation**: live window plus history, hourly or daily
//! - **Water-level alert**: flags levels at or below 140 cm
//! - **Testability**: [`Transport`] and [`Clock`] seams with [`MockTransport`]
//!   and [`ManualClock`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use eisbach_core::{HttpTransport, SourceContext, Tracker, ViewMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new("http://localhost:8080")?);
//!     let tracker = Tracker::new(SourceContext::new(transport));
//!
//!     tracker.water().refresh().await;
//!     if let Some(water) = tracker.water().current() {
//!         println!("Level: {:?} cm", water.water_level);
//!     }
//!
//!     tracker.water().load_history().await;
//!     let daily = tracker.water().chart(ViewMode::Daily);
//!     println!("{} days of history", daily.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod context;
pub mod error;
pub mod fetch;
pub mod history;
pub mod messages;
pub mod mock;
pub mod rotating;
pub mod surfers;
pub mod temperature;
pub mod tracker;
pub mod water;

pub use cache::{CacheStore, CachedValue, FileCache, MemoryCache, read_cached, write_cached};
pub use client::{DEFAULT_TIMEOUT, HttpTransport, Query, Transport, endpoints};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::SourceContext;
pub use error::{Error, Result};
pub use fetch::{CachePolicy, DataSource, FetchOutcome, FetchState, FetchStatus, SourceConfig};
pub use history::{HistoryAggregator, LIVE_WINDOW, ViewMode, local_offset};
pub use messages::{Locale, MessageSet};
pub use mock::{MockResponse, MockTransport, RecordedCall};
pub use rotating::{RestPolicy, RotatingMessages};
pub use surfers::{Readings, SurferLog};
pub use temperature::{TEMPERATURE_CACHE_KEY, TEMPERATURE_TTL, WaterTemperatureMonitor};
pub use tracker::Tracker;
pub use water::{DEFAULT_ALERT_THRESHOLD, WaterLevelMonitor};

// Re-export types for convenience
pub use eisbach_types;
pub use eisbach_types::{
    ChartSeries, HistoricalWaterLevel, NewSurferEntry, PredictionResponse, SurferEntry,
    WaterConditions, WaterTemperature,
};
