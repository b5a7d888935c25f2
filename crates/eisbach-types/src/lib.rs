//! Shared types for the Eisbach river-condition tracker.
//!
//! This crate provides the data transfer types exchanged with the tracker
//! backend, the series types used for charting, and helpers for the localized
//! date and number formats used by the Bavarian data portals.
//!
//! # Example
//!
//! ```
//! use eisbach_types::{HistoricalWaterLevel, parse_local_timestamp};
//! use time::UtcOffset;
//!
//! let row = HistoricalWaterLevel { date_time: "05.04.2025 14:00:00".into(), value: 142.0 };
//! let ts = parse_local_timestamp(&row.date_time, UtcOffset::UTC).unwrap();
//! assert_eq!(ts.minute(), 0);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    ChartSeries, HistoricalWaterLevel, NewSurferEntry, PredictionResponse, SeriesPoint,
    SurferEntry, WaterConditions, WaterTemperature, WeatherCondition, format_local_label,
    parse_decimal, parse_local_timestamp,
};
