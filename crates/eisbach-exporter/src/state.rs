//! Application state shared across handlers.
//!
//! Exports are slow (a readiness poll alone can take half a minute), so the
//! state serializes them behind one lock and can keep the last result for
//! `server.cache_ttl_secs`. With a TTL configured, a failed export falls back
//! to the last known temperature.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::exporter::TemperatureSource;

#[derive(Debug, Clone, Copy)]
struct LastExport {
    temperature: f64,
    at: Instant,
}

/// Shared application state.
pub struct AppState {
    source: Arc<dyn TemperatureSource>,
    cache_ttl: Duration,
    last: Mutex<Option<LastExport>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(source: Arc<dyn TemperatureSource>, cache_ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            cache_ttl,
            last: Mutex::new(None),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Current water temperature, served from the last export while fresh.
    pub async fn temperature(&self) -> Result<f64> {
        let mut last = self.last.lock().await;
        let caching = !self.cache_ttl.is_zero();

        if caching
            && let Some(cached) = *last
            && cached.at.elapsed() < self.cache_ttl
        {
            debug!(temperature = cached.temperature, "Serving cached temperature");
            return Ok(cached.temperature);
        }

        match self.source.temperature().await {
            Ok(temperature) => {
                *last = Some(LastExport {
                    temperature,
                    at: Instant::now(),
                });
                Ok(temperature)
            }
            Err(e) => match *last {
                Some(cached) if caching => {
                    warn!(error = %e, "Export failed, serving last known temperature");
                    Ok(cached.temperature)
                }
                _ => Err(e),
            },
        }
    }
}
