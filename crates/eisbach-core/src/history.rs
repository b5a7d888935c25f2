//! Chart series from live samples and historical water levels.
//!
//! The aggregator keeps two windows: a bounded live window of the most recent
//! samples (oldest evicted first) and a history window loaded in bulk. It
//! derives either an hourly series (today's history followed by the live
//! window) or a daily series (history averaged per calendar day).

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use eisbach_types::{
    ChartSeries, HistoricalWaterLevel, SeriesPoint, format_local_label, parse_local_timestamp,
};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::debug;

/// Number of live samples kept.
pub const LIVE_WINDOW: usize = 10;

/// Chart view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Today's history plus the live window.
    #[default]
    Hourly,
    /// One averaged point per day of history.
    Daily,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Hourly => f.write_str("hourly"),
            ViewMode::Daily => f.write_str("daily"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(ViewMode::Hourly),
            "daily" => Ok(ViewMode::Daily),
            other => Err(format!("unknown view '{other}' (expected hourly or daily)")),
        }
    }
}

/// The UTC offset of the local timezone, or UTC when it cannot be determined.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Live and historical water-level series.
#[derive(Debug, Clone)]
pub struct HistoryAggregator {
    live: VecDeque<SeriesPoint>,
    history: Vec<SeriesPoint>,
    capacity: usize,
    offset: UtcOffset,
}

impl Default for HistoryAggregator {
    fn default() -> Self {
        Self::new(local_offset())
    }
}

impl HistoryAggregator {
    /// Create an empty aggregator interpreting local timestamps in `offset`.
    pub fn new(offset: UtcOffset) -> Self {
        Self::with_capacity(offset, LIVE_WINDOW)
    }

    /// Create an aggregator with a custom live-window size.
    pub fn with_capacity(offset: UtcOffset, capacity: usize) -> Self {
        Self {
            live: VecDeque::with_capacity(capacity),
            history: Vec::new(),
            capacity,
            offset,
        }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Append a live sample, evicting the oldest beyond the window size.
    pub fn push_live(&mut self, timestamp: OffsetDateTime, value: f64) {
        let local = timestamp.to_offset(self.offset);
        let label = local
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_else(|_| format_local_label(timestamp, self.offset));
        self.live.push_back(SeriesPoint {
            label,
            timestamp,
            value,
        });
        while self.live.len() > self.capacity {
            self.live.pop_front();
        }
    }

    /// Live samples, oldest first.
    pub fn live(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.live.iter()
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Loaded history, ascending.
    pub fn history(&self) -> &[SeriesPoint] {
        &self.history
    }

    /// Replace the history window with `rows`.
    ///
    /// Rows whose timestamp cannot be parsed are dropped. Returns the number
    /// of rows kept.
    pub fn load_history(&mut self, rows: &[HistoricalWaterLevel]) -> usize {
        let mut points: Vec<SeriesPoint> = rows
            .iter()
            .filter_map(|row| match parse_local_timestamp(&row.date_time, self.offset) {
                Ok(timestamp) => Some(SeriesPoint {
                    label: format_local_label(timestamp, self.offset),
                    timestamp,
                    value: row.value,
                }),
                Err(e) => {
                    debug!(error = %e, "Dropping history row");
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);
        debug!(
            kept = points.len(),
            dropped = rows.len() - points.len(),
            "Loaded water level history"
        );
        self.history = points;
        self.history.len()
    }

    /// History points on the local calendar day `today`, followed by the live window.
    pub fn hourly(&self, today: Date) -> ChartSeries {
        self.history
            .iter()
            .filter(|p| p.timestamp.to_offset(self.offset).date() == today)
            .chain(self.live.iter())
            .map(|p| (p.label.clone(), p.value))
            .collect()
    }

    /// History averaged per day, one point per day in first-seen order.
    ///
    /// Days are taken from the date portion of each point's label; means are
    /// rounded to the nearest integer.
    pub fn daily(&self) -> ChartSeries {
        let mut order: Vec<(String, f64, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for point in &self.history {
            let day = point
                .label
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            match index.get(&day) {
                Some(&i) => {
                    order[i].1 += point.value;
                    order[i].2 += 1;
                }
                None => {
                    index.insert(day.clone(), order.len());
                    order.push((day, point.value, 1));
                }
            }
        }

        order
            .into_iter()
            .map(|(day, sum, count)| (day, (sum / count as f64).round()))
            .collect()
    }

    /// The series for `mode` as of `now`.
    pub fn view(&self, mode: ViewMode, now: OffsetDateTime) -> ChartSeries {
        match mode {
            ViewMode::Hourly => self.hourly(now.to_offset(self.offset).date()),
            ViewMode::Daily => self.daily(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    fn row(date_time: &str, value: f64) -> HistoricalWaterLevel {
        HistoricalWaterLevel {
            date_time: date_time.to_string(),
            value,
        }
    }

    #[test]
    fn test_live_window_evicts_oldest() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        let start = datetime!(2025-04-05 12:00 UTC);
        for i in 0..15 {
            agg.push_live(start + time::Duration::minutes(i), i as f64);
        }
        assert_eq!(agg.live_len(), LIVE_WINDOW);
        let values: Vec<f64> = agg.live().map(|p| p.value).collect();
        assert_eq!(values, (5..15).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(agg.live().next().unwrap().label, "12:05:00");
    }

    #[test]
    fn test_load_history_drops_malformed_rows() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        let rows = vec![
            row("05.04.2025 14:00:00", 140.0),
            row("yesterday-ish", 999.0),
            row("05.04.2025 13:00:00", 139.0),
        ];
        assert_eq!(agg.load_history(&rows), rows.len() - 1);
        let labels: Vec<&str> = agg.history().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["05.04.2025 13:00", "05.04.2025 14:00"]);
    }

    #[test]
    fn test_load_history_replaces_previous() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        agg.load_history(&[row("05.04.2025 14:00", 1.0), row("05.04.2025 15:00", 2.0)]);
        agg.load_history(&[row("06.04.2025 14:00", 3.0)]);
        assert_eq!(agg.history().len(), 1);
    }

    #[test]
    fn test_daily_means_in_first_seen_order() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        agg.load_history(&[
            row("01.04.2025 08:00", 10.0),
            row("01.04.2025 20:00", 20.0),
            row("02.04.2025 08:00", 30.0),
        ]);
        let daily = agg.daily();
        assert_eq!(daily.labels, vec!["01.04.2025", "02.04.2025"]);
        assert_eq!(daily.values, vec![15.0, 30.0]);
    }

    #[test]
    fn test_daily_rounds_to_nearest() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        agg.load_history(&[
            row("01.04.2025 08:00", 140.0),
            row("01.04.2025 09:00", 141.0),
            row("01.04.2025 10:00", 141.0),
        ]);
        assert_eq!(agg.daily().values, vec![141.0]);
    }

    #[test]
    fn test_hourly_is_today_plus_live() {
        let mut agg = HistoryAggregator::new(UtcOffset::UTC);
        agg.load_history(&[
            row("04.04.2025 23:00", 100.0),
            row("05.04.2025 09:00", 142.0),
            row("05.04.2025 08:00", 141.0),
        ]);
        agg.push_live(datetime!(2025-04-05 12:30 UTC), 143.0);

        let hourly = agg.hourly(date!(2025-04-05));
        assert_eq!(
            hourly.labels,
            vec!["05.04.2025 08:00", "05.04.2025 09:00", "12:30:00"]
        );
        assert_eq!(hourly.values, vec![141.0, 142.0, 143.0]);
    }

    #[test]
    fn test_view_uses_local_day() {
        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        let mut agg = HistoryAggregator::new(offset);
        agg.load_history(&[row("06.04.2025 00:30", 150.0), row("05.04.2025 23:00", 149.0)]);

        // 23:00 UTC on the 5th is already the 6th in UTC+2.
        let series = agg.view(ViewMode::Hourly, datetime!(2025-04-05 23:00 UTC));
        assert_eq!(series.values, vec![150.0]);

        let daily = agg.view(ViewMode::Daily, datetime!(2025-04-05 23:00 UTC));
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("Daily".parse::<ViewMode>().unwrap(), ViewMode::Daily);
        assert!("weekly".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Hourly.to_string(), "hourly");
    }

    proptest! {
        #[test]
        fn prop_live_window_keeps_last_n(values in proptest::collection::vec(0.0f64..500.0, 0..40)) {
            let mut agg = HistoryAggregator::new(UtcOffset::UTC);
            let start = datetime!(2025-04-05 00:00 UTC);
            for (i, v) in values.iter().enumerate() {
                agg.push_live(start + time::Duration::seconds(i as i64), *v);
            }
            let kept: Vec<f64> = agg.live().map(|p| p.value).collect();
            let expected: Vec<f64> = values.iter().rev().take(LIVE_WINDOW).rev().copied().collect();
            prop_assert!(agg.live_len() <= LIVE_WINDOW);
            prop_assert_eq!(kept, expected);
        }
    }
}
