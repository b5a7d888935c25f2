//! Surfers command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use eisbach_core::{CachePolicy, NewSurferEntry, Readings, Tracker};
use eisbach_types::format_local_label;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::cli::{OutputFormat, SurfersAction};
use crate::format::{FormatOptions, format_entries_text};
use crate::util::{require_success, with_status, write_output};

/// Arguments for the surfers command.
pub struct SurfersArgs<'a> {
    pub action: SurfersAction,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub cache: CachePolicy,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_surfers(tracker: &Tracker, args: SurfersArgs<'_>) -> Result<()> {
    let SurfersArgs {
        action,
        format,
        output,
        cache,
        quiet,
        opts,
    } = args;

    match action {
        SurfersAction::List { limit } => {
            let entries = tracker.surfers().entries();
            let outcome =
                with_status(entries.status(), quiet, tracker.surfers().fetch_entries()).await;
            require_success(outcome, entries)?;

            let all = tracker.surfer_entries();
            let shown = if limit > 0 && all.len() > limit {
                &all[all.len() - limit..]
            } else {
                &all[..]
            };
            let content = match format {
                OutputFormat::Json => opts.to_json(shown)?,
                OutputFormat::Text => format_entries_text(shown, opts),
            };
            write_output(output, &content)
        }
        SurfersAction::Add {
            count,
            timestamp,
            water_level,
            water_flow,
            water_temperature,
        } => {
            let timestamp = match timestamp {
                Some(s) => parse_timestamp(&s)?,
                None => OffsetDateTime::now_utc(),
            };
            let given = Readings {
                water_level,
                water_flow,
                water_temperature,
            };

            if given.water_level.is_none() || given.water_flow.is_none() {
                tracker.water().refresh().await;
            }
            if given.water_temperature.is_none() {
                tracker.temperature().fetch(cache).await;
            }
            let readings = given.or(tracker.latest_readings());

            let entries = tracker.surfers().entries();
            let outcome = with_status(
                entries.status(),
                quiet,
                tracker.add_surfer_entry(count, Some(timestamp), readings),
            )
            .await;
            require_success(outcome, entries)?;

            let submitted = NewSurferEntry {
                count,
                timestamp,
                water_level: readings.water_level,
                water_flow: readings.water_flow,
                water_temperature: readings.water_temperature,
            };
            let content = match format {
                OutputFormat::Json => opts.to_json(&submitted)?,
                OutputFormat::Text => format!(
                    "Recorded {} surfer{} at {}\n",
                    count,
                    if count == 1 { "" } else { "s" },
                    format_local_label(timestamp, opts.offset)
                ),
            };
            write_output(output, &content)
        }
    }
}

/// Parse an RFC3339 observation time.
fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).with_context(|| {
        format!("Invalid timestamp '{s}'. Use RFC3339, e.g. 2025-04-05T14:30:00+02:00")
    })
}
