//! History command implementation.

use std::path::PathBuf;

use anyhow::Result;
use eisbach_core::{Tracker, ViewMode};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_chart_json, format_chart_text};
use crate::util::{require_success, with_status, write_output};

/// Arguments for the history command.
pub struct HistoryArgs<'a> {
    pub view: ViewMode,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_history(tracker: &Tracker, args: HistoryArgs<'_>) -> Result<()> {
    let HistoryArgs {
        view,
        format,
        output,
        quiet,
        opts,
    } = args;

    let water = tracker.water();
    let outcome = with_status(water.history().status(), quiet, water.load_history()).await;
    require_success(outcome, water.history())?;

    if view == ViewMode::Hourly {
        // Adds the current level to today's series.
        let outcome = water.refresh().await;
        if let Err(e) = require_success(outcome, water.conditions()) {
            tracing::warn!("Current water level unavailable: {e}");
        }
    }

    let series = water.chart(view);
    let content = match format {
        OutputFormat::Json => format_chart_json(&series, view, opts)?,
        OutputFormat::Text => format_chart_text(&series, view, opts),
    };
    write_output(output, &content)
}
