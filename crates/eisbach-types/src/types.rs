//! Core types for Eisbach river-condition data.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{ParseError, ParseResult};

/// A crowd-sourced surfer count, as stored by the backend.
///
/// Entries are immutable once stored; the client never edits past entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurferEntry {
    /// When the count was observed.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Number of surfers on the wave.
    pub count: u32,
    /// Water level in cm at submission time.
    #[serde(default)]
    pub water_level: Option<f64>,
    /// Water flow in m³/s at submission time.
    #[serde(default)]
    pub water_flow: Option<f64>,
    /// Water temperature in °C at submission time.
    #[serde(default)]
    pub water_temperature: Option<f64>,
}

/// Body of `POST /surfers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurferEntry {
    pub count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_flow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_temperature: Option<f64>,
}

/// Weather condition as reported by the prediction backend.
///
/// Older backends send a WMO code, newer ones a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeatherCondition {
    /// Numeric WMO weather code (`-1` when unknown).
    Code(i32),
    /// Human-readable label.
    Label(String),
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherCondition::Code(code) => write!(f, "WMO {code}"),
            WeatherCondition::Label(label) => f.write_str(label),
        }
    }
}

/// Response of `GET /surfers/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Hour of day the prediction is for (0-23).
    pub hour: u8,
    #[serde(default)]
    pub water_temperature: Option<f64>,
    #[serde(default)]
    pub water_level: Option<f64>,
    #[serde(default)]
    pub air_temperature: Option<f64>,
    #[serde(default)]
    pub weather_condition: Option<WeatherCondition>,
    /// Predicted number of surfers.
    pub prediction: f64,
    /// Contribution of each named feature to the prediction.
    #[serde(default)]
    pub explanation: BTreeMap<String, f64>,
}

impl PredictionResponse {
    /// Predicted count rounded to a whole number of surfers.
    pub fn predicted_count(&self) -> u32 {
        self.prediction.round().max(0.0) as u32
    }

    /// Explanation entries ordered by absolute contribution, largest first.
    pub fn ranked_explanation(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self
            .explanation
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }
}

/// Response of `GET /conditions/water`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterConditions {
    /// When the backend fetched the values (backend-defined format).
    #[serde(default)]
    pub request_date: String,
    /// Water level in cm.
    #[serde(default)]
    pub water_level: Option<f64>,
    /// Water flow in m³/s.
    #[serde(default)]
    pub water_flow: Option<f64>,
}

impl WaterConditions {
    /// Parse `request_date` as an RFC 3339 instant, if it is one.
    pub fn requested_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(
            &self.request_date,
            &time::format_description::well_known::Rfc3339,
        )
        .ok()
    }
}

/// Response of `GET /conditions/water/temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterTemperature {
    /// Water temperature in °C.
    #[serde(alias = "temperature")]
    pub water_temperature: f64,
}

/// One row of `GET /conditions/water/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalWaterLevel {
    /// Localized timestamp, `DD.MM.YYYY HH:MM:SS`.
    #[serde(rename = "DateTime")]
    pub date_time: String,
    /// Water level in cm.
    #[serde(rename = "Value")]
    pub value: f64,
}

/// A single chartable point of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Display label.
    pub label: String,
    /// Instant of the sample.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub value: f64,
}

/// Parallel label/value sequences ready for a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(label, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl FromIterator<(String, f64)> for ChartSeries {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let (labels, values) = iter.into_iter().unzip();
        Self { labels, values }
    }
}

/// Parse a localized `DD.MM.YYYY HH:MM[:SS]` timestamp in the given offset.
///
/// # Examples
///
/// ```
/// use eisbach_types::parse_local_timestamp;
/// use time::UtcOffset;
///
/// let ts = parse_local_timestamp("05.04.2025 14:30", UtcOffset::UTC).unwrap();
/// assert_eq!(ts.hour(), 14);
/// assert!(parse_local_timestamp("2025-04-05 14:30", UtcOffset::UTC).is_err());
/// ```
pub fn parse_local_timestamp(input: &str, offset: UtcOffset) -> ParseResult<OffsetDateTime> {
    let with_seconds = format_description!("[day].[month].[year] [hour]:[minute]:[second]");
    let without_seconds = format_description!("[day].[month].[year] [hour]:[minute]");

    let trimmed = input.trim();
    PrimitiveDateTime::parse(trimmed, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, without_seconds))
        .map(|dt| dt.assume_offset(offset))
        .map_err(|_| ParseError::InvalidTimestamp {
            input: input.to_string(),
        })
}

/// Format an instant as a `DD.MM.YYYY HH:MM` display label in the given offset.
pub fn format_local_label(ts: OffsetDateTime, offset: UtcOffset) -> String {
    let local = ts.to_offset(offset);
    format!(
        "{:02}.{:02}.{:04} {:02}:{:02}",
        local.day(),
        u8::from(local.month()),
        local.year(),
        local.hour(),
        local.minute()
    )
}

/// Parse a number that may use a decimal comma (`"7,1"` → `7.1`).
pub fn parse_decimal(input: &str) -> ParseResult<f64> {
    input
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| ParseError::InvalidNumber(input.to_string()))
}
