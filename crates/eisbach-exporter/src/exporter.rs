//! The export pipeline: session, enqueue, readiness, download, parse.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};

use crate::archive::{self, Record};
use crate::config::{PollConfig, PortalConfig};
use crate::error::Result;
use crate::poll::wait_until_ready;
use crate::portal::{ExportRequest, Portal, artifact_url};

/// Something that can report the current water temperature.
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    /// Water temperature in °C.
    async fn temperature(&self) -> Result<f64>;
}

/// Runs temperature exports against a [`Portal`].
#[derive(Debug)]
pub struct Exporter<P> {
    portal: P,
    request: PortalConfig,
    poll: PollConfig,
    offset: UtcOffset,
}

impl<P: Portal> Exporter<P> {
    /// Create an exporter that dates its requests in UTC.
    pub fn new(portal: P, request: PortalConfig, poll: PollConfig) -> Self {
        Self {
            portal,
            request,
            poll,
            offset: UtcOffset::UTC,
        }
    }

    /// Date export ranges in the local time zone at `offset`.
    #[must_use]
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    /// Calendar date of `now` at the configured offset.
    pub fn today(&self, now: OffsetDateTime) -> Date {
        now.to_offset(self.offset).date()
    }

    /// Export the configured range ending on `today` and return its rows.
    pub async fn export(&self, today: Date) -> Result<Vec<Record>> {
        self.portal.open_session().await?;

        let request = ExportRequest::ending(&self.request, today);
        let token = self.portal.enqueue(&request).await?.token()?;
        debug!(%token, "Export enqueued");

        let url = artifact_url(&self.request.download_url, &token);
        wait_until_ready(&self.portal, &url, &self.poll).await?;

        let file = NamedTempFile::new()?;
        let records = self.download_and_parse(&url, &file).await;

        let path = file.into_temp_path();
        let shown = path.display().to_string();
        if let Err(e) = path.close() {
            warn!(path = %shown, error = %e, "Failed to delete export archive");
        }

        let records = records?;
        info!(rows = records.len(), "Export parsed");
        Ok(records)
    }

    async fn download_and_parse(&self, url: &str, file: &NamedTempFile) -> Result<Vec<Record>> {
        self.portal.download(url, file.path()).await?;
        parse_archive(file.path().to_path_buf()).await
    }

    /// Latest mean temperature from a fresh export.
    pub async fn latest_temperature(&self) -> Result<f64> {
        let today = self.today(OffsetDateTime::now_utc());
        let records = self.export(today).await?;
        archive::latest_temperature(&records)
    }
}

/// Unzip and parse a downloaded archive on the blocking pool.
async fn parse_archive(path: PathBuf) -> Result<Vec<Record>> {
    tokio::task::spawn_blocking(move || {
        let text = archive::extract_csv(&path)?;
        archive::normalize(&text)
    })
    .await
    .map_err(|e| io::Error::other(format!("Archive parsing task failed: {e}")))?
}

#[async_trait]
impl<P: Portal> TemperatureSource for Exporter<P> {
    async fn temperature(&self) -> Result<f64> {
        self.latest_temperature().await
    }
}
