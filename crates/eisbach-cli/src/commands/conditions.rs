//! Conditions command implementation.

use std::path::PathBuf;

use anyhow::Result;
use eisbach_core::{CachePolicy, Tracker};

use crate::cli::OutputFormat;
use crate::format::{Conditions, FormatOptions, format_conditions_text};
use crate::util::{require_success, with_status, write_output};

/// Arguments for the conditions command.
pub struct ConditionsArgs<'a> {
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub cache: CachePolicy,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_conditions(tracker: &Tracker, args: ConditionsArgs<'_>) -> Result<()> {
    let ConditionsArgs {
        format,
        output,
        cache,
        quiet,
        opts,
    } = args;

    let water = tracker.water();
    let outcome = with_status(water.conditions().status(), quiet, water.refresh()).await;
    require_success(outcome, water.conditions())?;

    // The temperature comes from a slow export; show the conditions without it.
    let temperature = tracker.temperature();
    let outcome = with_status(temperature.source().status(), quiet, temperature.fetch(cache)).await;
    if let Err(e) = require_success(outcome, temperature.source()) {
        tracing::warn!("Water temperature unavailable: {e}");
    }

    let conditions = snapshot(tracker);
    let content = match format {
        OutputFormat::Json => opts.to_json(&conditions)?,
        OutputFormat::Text => format_conditions_text(&conditions, opts),
    };
    write_output(output, &content)
}

/// Current conditions as held by the tracker.
pub fn snapshot(tracker: &Tracker) -> Conditions {
    let current = tracker.water().current();
    Conditions {
        water_level: current.as_ref().and_then(|c| c.water_level),
        water_flow: current.as_ref().and_then(|c| c.water_flow),
        water_temperature: tracker.temperature().temperature(),
        alert: tracker.water().alert(),
        alert_threshold: tracker.water().alert_threshold(),
        request_date: current
            .map(|c| c.request_date)
            .filter(|d| !d.is_empty()),
    }
}
