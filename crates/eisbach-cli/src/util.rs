//! Utility functions for CLI operations.

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use eisbach_core::{DataSource, FetchOutcome, RotatingMessages};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Run `fut`, calling `on_message` whenever the status line changes.
pub async fn follow_status<F, M>(status: &RotatingMessages, fut: F, mut on_message: M) -> F::Output
where
    F: Future,
    M: FnMut(&str),
{
    let mut rx = status.subscribe();
    let mut last = String::new();
    tokio::pin!(fut);

    loop {
        tokio::select! {
            biased;
            output = &mut fut => return output,
            changed = rx.changed() => {
                if changed.is_err() {
                    return fut.await;
                }
                let message = rx.borrow_and_update().clone();
                if !message.is_empty() && message != last {
                    on_message(&message);
                    last = message;
                }
            }
        }
    }
}

/// Run `fut`, echoing status messages to stderr unless `quiet`.
pub async fn with_status<F: Future>(status: &RotatingMessages, quiet: bool, fut: F) -> F::Output {
    if quiet {
        return fut.await;
    }
    follow_status(status, fut, |message| eprintln!("{message}")).await
}

/// Turn a failed fetch into an error carrying the source's message.
pub fn require_success<T>(outcome: FetchOutcome, source: &DataSource<T>) -> Result<()>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    match outcome {
        FetchOutcome::Failed => {
            let message = source
                .state()
                .error_message
                .unwrap_or_else(|| format!("Failed to fetch {}", source.name()));
            Err(anyhow!(message))
        }
        _ => Ok(()),
    }
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
