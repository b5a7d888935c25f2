//! Output formatting utilities for text and JSON output.

use std::fmt::Write as _;

use anyhow::Result;
use eisbach_core::{ChartSeries, PredictionResponse, SurferEntry, ViewMode};
use eisbach_types::format_local_label;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

/// Width of the widest chart bar in characters.
const BAR_WIDTH: usize = 30;

/// Formatting options for output.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
    /// Offset used to display timestamps.
    pub offset: UtcOffset,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            no_color: false,
            compact: false,
            offset: UtcOffset::UTC,
        }
    }
}

impl FormatOptions {
    /// Serialize value to JSON string, respecting compact option.
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn alert(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.red().bold().to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.dimmed().to_string()
        }
    }
}

fn value_or_dash(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1} {unit}"),
        None => "-".to_string(),
    }
}

/// Snapshot of the current river conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditions {
    pub water_level: Option<f64>,
    pub water_flow: Option<f64>,
    pub water_temperature: Option<f64>,
    pub alert: bool,
    pub alert_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
}

pub fn format_conditions_text(conditions: &Conditions, opts: &FormatOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Water level:       {}",
        value_or_dash(conditions.water_level, "cm")
    );
    let _ = writeln!(
        out,
        "Water flow:        {}",
        value_or_dash(conditions.water_flow, "m³/s")
    );
    let _ = writeln!(
        out,
        "Water temperature: {}",
        value_or_dash(conditions.water_temperature, "°C")
    );
    if let Some(date) = &conditions.request_date {
        let _ = writeln!(out, "{}", opts.dim(&format!("Measured:          {date}")));
    }
    if conditions.alert {
        let message = format!(
            "Water level at or below {} cm, longboard only",
            conditions.alert_threshold
        );
        let _ = writeln!(out, "{}", opts.alert(&message));
    }
    out
}

/// One line per polled water level.
pub fn format_watch_line(
    at: OffsetDateTime,
    level: Option<f64>,
    flow: Option<f64>,
    alert: bool,
    opts: &FormatOptions,
) -> String {
    let time = at.to_offset(opts.offset);
    let mut line = format!(
        "[{:02}:{:02}:{:02}] level {}  flow {}",
        time.hour(),
        time.minute(),
        time.second(),
        value_or_dash(level, "cm"),
        value_or_dash(flow, "m³/s"),
    );
    if alert {
        line.push_str("  ");
        line.push_str(&opts.alert("ALERT"));
    }
    line.push('\n');
    line
}

/// Horizontal bar chart of a series, scaled between its minimum and maximum.
pub fn format_chart_text(series: &ChartSeries, mode: ViewMode, opts: &FormatOptions) -> String {
    if series.is_empty() {
        return format!("No {mode} data available.\n");
    }

    let min = series.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let label_width = series.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in series.points() {
        let filled = if span > 0.0 {
            1 + (((value - min) / span) * (BAR_WIDTH - 1) as f64).round() as usize
        } else {
            BAR_WIDTH
        };
        let bar = "█".repeat(filled);
        let _ = writeln!(
            out,
            "{label:<label_width$}  {value:>6.1}  {}",
            opts.dim(&bar)
        );
    }
    out
}

#[derive(Serialize)]
struct ChartJson<'a> {
    view: ViewMode,
    labels: &'a [String],
    values: &'a [f64],
}

pub fn format_chart_json(series: &ChartSeries, mode: ViewMode, opts: &FormatOptions) -> Result<String> {
    opts.to_json(&ChartJson {
        view: mode,
        labels: &series.labels,
        values: &series.values,
    })
}

pub fn format_entries_text(entries: &[SurferEntry], opts: &FormatOptions) -> String {
    if entries.is_empty() {
        return "No surfer entries yet.\n".to_string();
    }

    let mut out = format!(
        "{:<16}  {:>5}  {:>10}  {:>11}  {:>8}\n",
        "Time", "Count", "Level", "Flow", "Temp"
    );
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<16}  {:>5}  {:>10}  {:>11}  {:>8}",
            format_local_label(entry.timestamp, opts.offset),
            entry.count,
            value_or_dash(entry.water_level, "cm"),
            value_or_dash(entry.water_flow, "m³/s"),
            value_or_dash(entry.water_temperature, "°C"),
        );
    }
    out
}

pub fn format_prediction_text(prediction: &PredictionResponse, opts: &FormatOptions) -> String {
    let mut out = format!(
        "Predicted surfers at {:02}:00: {}\n",
        prediction.hour,
        prediction.predicted_count()
    );
    if let Some(t) = prediction.water_temperature {
        let _ = writeln!(out, "  water temperature {t:.1} °C");
    }
    if let Some(level) = prediction.water_level {
        let _ = writeln!(out, "  water level       {level:.1} cm");
    }
    if let Some(t) = prediction.air_temperature {
        let _ = writeln!(out, "  air temperature   {t:.1} °C");
    }
    if let Some(weather) = &prediction.weather_condition {
        let _ = writeln!(out, "  weather           {weather}");
    }

    let ranked = prediction.ranked_explanation();
    if !ranked.is_empty() {
        let _ = writeln!(out, "{}", opts.dim("Contributions:"));
        for (name, value) in ranked {
            let _ = writeln!(out, "  {name:<20} {value:+.2}");
        }
    }
    out
}
