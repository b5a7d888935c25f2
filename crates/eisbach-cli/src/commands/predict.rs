//! Predict command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use eisbach_core::{CachePolicy, Tracker};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_prediction_text};
use crate::util::{require_success, with_status, write_output};

/// Arguments for the predict command.
pub struct PredictArgs<'a> {
    pub hour: Option<u8>,
    pub temperature: Option<f64>,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub cache: CachePolicy,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_predict(tracker: &Tracker, args: PredictArgs<'_>) -> Result<()> {
    let PredictArgs {
        hour,
        temperature,
        format,
        output,
        cache,
        quiet,
        opts,
    } = args;

    if temperature.is_none() {
        let source = tracker.temperature().source();
        let outcome = with_status(source.status(), quiet, tracker.temperature().fetch(cache)).await;
        if let Err(e) = require_success(outcome, source) {
            tracing::warn!("Predicting without water temperature: {e}");
        }
    }

    let source = tracker.surfers().prediction();
    let outcome = with_status(source.status(), quiet, tracker.predict(hour, temperature)).await;
    require_success(outcome, source)?;

    let prediction = source.value().context("Backend returned no prediction")?;
    let content = match format {
        OutputFormat::Json => opts.to_json(&prediction)?,
        OutputFormat::Text => format_prediction_text(&prediction, opts),
    };
    write_output(output, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use eisbach_core::{MockResponse, MockTransport, SourceContext, endpoints};

    #[tokio::test]
    async fn test_predict_uses_latest_temperature() {
        let transport = Arc::new(MockTransport::new());
        transport.on_get(
            endpoints::WATER_TEMPERATURE,
            MockResponse::Body(r#"{"water_temperature": 10.5}"#.to_string()),
        );
        transport.on_get(
            endpoints::PREDICT,
            MockResponse::Body(
                r#"{"hour": 17, "prediction": 6.2, "explanation": {"hour": 1.5}}"#.to_string(),
            ),
        );
        let tracker = Tracker::new(SourceContext::new(transport.clone()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prediction.txt");
        let opts = FormatOptions {
            no_color: true,
            ..FormatOptions::default()
        };

        cmd_predict(
            &tracker,
            PredictArgs {
                hour: Some(17),
                temperature: None,
                format: OutputFormat::Text,
                output: Some(&path),
                cache: CachePolicy::Bypass,
                quiet: true,
                opts: &opts,
            },
        )
        .await
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Predicted surfers at 17:00: 6"));

        let call = transport
            .calls()
            .into_iter()
            .find(|c| c.path == endpoints::PREDICT)
            .unwrap();
        assert!(call.query.contains(&("hour".to_string(), "17".to_string())));
        assert!(call.query.contains(&("water_temperature".to_string(), "10.5".to_string())));
    }

    #[tokio::test]
    async fn test_predict_failure_is_reported() {
        let transport = Arc::new(MockTransport::new());
        transport.on_get(endpoints::PREDICT, MockResponse::Status(502));
        let tracker = Tracker::new(SourceContext::new(transport));
        let opts = FormatOptions::default();

        let result = cmd_predict(
            &tracker,
            PredictArgs {
                hour: Some(8),
                temperature: Some(9.0),
                format: OutputFormat::Json,
                output: None,
                cache: CachePolicy::Bypass,
                quiet: true,
                opts: &opts,
            },
        )
        .await;
        assert!(result.is_err());
    }
}
