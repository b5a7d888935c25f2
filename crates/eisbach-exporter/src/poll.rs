//! Readiness polling of an export artifact.

use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::PollConfig;
use crate::error::{ExportError, Result};
use crate::portal::Portal;

/// Probe `url` until it reports a positive size.
///
/// Each failed check is followed by a fixed backoff, except the last one.
/// Returns the reported size, or [`ExportError::NotReady`] once
/// `config.attempts` checks have failed. Transport errors abort immediately.
pub async fn wait_until_ready<P>(portal: &P, url: &str, config: &PollConfig) -> Result<u64>
where
    P: Portal + ?Sized,
{
    for attempt in 1..=config.attempts {
        if let Some(size) = portal.probe(url).await? {
            info!(attempt, size, "Export ready");
            return Ok(size);
        }
        debug!(attempt, max = config.attempts, "Export not ready yet");
        if attempt < config.attempts {
            sleep(config.backoff()).await;
        }
    }

    Err(ExportError::NotReady {
        attempts: config.attempts,
        backoff: config.backoff(),
    })
}
