//! Watch command implementation.
//!
//! Polls the water level at a fixed interval, printing one line per reading.
//! On exit the live window is charted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use eisbach_core::{FetchOutcome, Tracker, ViewMode};
use serde::Serialize;
use time::OffsetDateTime;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_chart_text, format_watch_line};
use crate::util::{with_status, write_output};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub interval: u64,
    pub count: u32,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

#[derive(Serialize)]
struct WatchRecord {
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    water_level: Option<f64>,
    water_flow: Option<f64>,
    alert: bool,
}

pub async fn cmd_watch(tracker: &Tracker, args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        interval,
        count,
        format,
        output,
        quiet,
        opts,
    } = args;

    if interval == 0 {
        bail!("Interval must be at least 1 second");
    }

    if !quiet {
        eprintln!(
            "Watching water level every {}s (Ctrl+C to stop)...",
            interval
        );
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let line_opts = FormatOptions {
        compact: true,
        ..*opts
    };

    let mut readings_taken: u32 = 0;
    let mut collected = String::new();

    loop {
        if count > 0 && readings_taken >= count {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                break;
            }
            _ = ticker.tick() => {}
        }

        let water = tracker.water();
        let outcome = with_status(water.conditions().status(), quiet, water.refresh()).await;
        readings_taken += 1;

        match outcome {
            FetchOutcome::Fresh => {
                let current = tracker.water().current();
                let record = WatchRecord {
                    timestamp: OffsetDateTime::now_utc(),
                    water_level: current.as_ref().and_then(|c| c.water_level),
                    water_flow: current.as_ref().and_then(|c| c.water_flow),
                    alert: tracker.water().alert(),
                };
                let line = match format {
                    OutputFormat::Json => line_opts.to_json(&record)?,
                    OutputFormat::Text => format_watch_line(
                        record.timestamp,
                        record.water_level,
                        record.water_flow,
                        record.alert,
                        opts,
                    ),
                };
                if output.is_some() {
                    collected.push_str(&line);
                } else {
                    write_output(None, &line)?;
                }
            }
            FetchOutcome::Failed => {
                let message = tracker
                    .water()
                    .conditions()
                    .state()
                    .error_message
                    .unwrap_or_default();
                eprintln!("Error: {message}");
            }
            _ => {}
        }
    }

    if !quiet {
        eprintln!("Completed {} readings.", readings_taken);
    }

    if format == OutputFormat::Text && tracker.water().live_len() > 1 {
        let chart = format_chart_text(&tracker.water().chart(ViewMode::Hourly), ViewMode::Hourly, opts);
        if output.is_some() {
            collected.push('\n');
            collected.push_str(&chart);
        } else {
            write_output(None, &format!("\n{chart}"))?;
        }
    }

    if output.is_some() {
        write_output(output, &collected)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use eisbach_core::{MockResponse, MockTransport, SourceContext, WaterConditions, endpoints};

    #[tokio::test(start_paused = true)]
    async fn test_watch_writes_readings_to_file() {
        let transport = Arc::new(MockTransport::new());
        for level in [150.0, 138.0] {
            transport.enqueue_get(
                endpoints::WATER_CONDITIONS,
                MockResponse::json(&WaterConditions {
                    request_date: String::new(),
                    water_level: Some(level),
                    water_flow: Some(20.0),
                }),
            );
        }
        let tracker = Tracker::new(SourceContext::new(transport.clone()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.ndjson");
        let opts = FormatOptions {
            no_color: true,
            ..FormatOptions::default()
        };

        cmd_watch(
            &tracker,
            WatchArgs {
                interval: 60,
                count: 2,
                format: OutputFormat::Json,
                output: Some(&path),
                quiet: true,
                opts: &opts,
            },
        )
        .await
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["water_level"], 150.0);
        assert_eq!(lines[0]["alert"], false);
        assert_eq!(lines[1]["alert"], true);
        assert_eq!(transport.call_count(endpoints::WATER_CONDITIONS), 2);
        assert_eq!(tracker.water().live_len(), 2);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let tracker = Tracker::new(SourceContext::new(Arc::new(MockTransport::new())));
        let opts = FormatOptions::default();
        let result = cmd_watch(
            &tracker,
            WatchArgs {
                interval: 0,
                count: 1,
                format: OutputFormat::Text,
                output: None,
                quiet: true,
                opts: &opts,
            },
        )
        .await;
        assert!(result.is_err());
    }
}
