//! Client for the hydrology portal's download center.
//!
//! An export takes four requests: the download page (sets session cookies),
//! a form POST that enqueues the job, repeated HEAD checks on the artifact,
//! and finally the artifact download itself.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, ORIGIN, REFERER};
use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Duration as DateSpan};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::error::{ExportError, Result};

/// Portal operations used by the export pipeline.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Visit the download page so later requests carry session cookies.
    async fn open_session(&self) -> Result<()>;

    /// Submit an export job.
    async fn enqueue(&self, request: &ExportRequest) -> Result<EnqueueResponse>;

    /// Size of the artifact at `url` if it is ready.
    async fn probe(&self, url: &str) -> Result<Option<u64>>;

    /// Download the artifact at `url` to `dest`, returning the bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Answer of the enqueue endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnqueueResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub deeplink: Option<String>,
}

impl EnqueueResponse {
    /// Token of an accepted job.
    pub fn token(&self) -> Result<String> {
        if self.result.as_deref() != Some("success") {
            return Err(ExportError::Enqueue(format!(
                "portal answered result={:?}",
                self.result
            )));
        }
        let deeplink = self
            .deeplink
            .as_deref()
            .ok_or_else(|| ExportError::Enqueue("response has no deeplink".to_string()))?;
        extract_token(deeplink)
            .ok_or_else(|| ExportError::Enqueue(format!("token not found in '{deeplink}'")))
    }
}

/// Alphanumeric value of the `token` query parameter in `deeplink`.
pub fn extract_token(deeplink: &str) -> Option<String> {
    let start = deeplink.find("token=")? + "token=".len();
    let token: String = deeplink[start..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    (!token.is_empty()).then_some(token)
}

/// Direct-download URL of a job's artifact.
pub fn artifact_url(download_url: &str, token: &str) -> String {
    format!("{download_url}?token={token}&dl=1")
}

/// Form fields of an export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub begin: Date,
    pub end: Date,
    pub station: String,
    pub series: String,
    pub email: String,
}

impl ExportRequest {
    /// Request the last `config.days` days ending on `today`.
    pub fn ending(config: &PortalConfig, today: Date) -> Self {
        let span = i64::from(config.days.max(1)) - 1;
        Self {
            begin: today.saturating_sub(DateSpan::days(span)),
            end: today,
            station: config.station.clone(),
            series: config.series.clone(),
            email: config.email.clone(),
        }
    }

    /// Form-encoded body fields.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let selection = serde_json::json!({ self.station.as_str(): [self.series.as_str()] });
        vec![
            ("zr", "monat".to_string()),
            ("beginn", format_date(self.begin)),
            ("ende", format_date(self.end)),
            ("email", self.email.clone()),
            ("geprueft", "0".to_string()),
            ("wertart", "tmw".to_string()),
            ("f", String::new()),
            ("t", selection.to_string()),
        ]
    }
}

fn format_date(date: Date) -> String {
    let format = format_description!("[day].[month].[year]");
    date.format(&format).unwrap_or_default()
}

/// [`Portal`] over HTTP with a cookie jar.
#[derive(Debug, Clone)]
pub struct HttpPortal {
    client: reqwest::Client,
    config: PortalConfig,
}

impl HttpPortal {
    pub fn new(config: PortalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExportError::Session(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }
}

#[async_trait]
impl Portal for HttpPortal {
    async fn open_session(&self) -> Result<()> {
        debug!(url = %self.config.page_url, "Visiting download page");
        self.client
            .get(&self.config.page_url)
            .header(REFERER, &self.config.page_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExportError::Session(e.to_string()))?;
        Ok(())
    }

    async fn enqueue(&self, request: &ExportRequest) -> Result<EnqueueResponse> {
        info!(
            station = %request.station,
            begin = %request.begin,
            end = %request.end,
            "Enqueueing export"
        );
        let response = self
            .client
            .post(&self.config.enqueue_url)
            .header(REFERER, &self.config.page_url)
            .header(ORIGIN, &self.config.origin)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .form(&request.form())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExportError::Enqueue(e.to_string()))?;
        response
            .json::<EnqueueResponse>()
            .await
            .map_err(|e| ExportError::Enqueue(e.to_string()))
    }

    async fn probe(&self, url: &str) -> Result<Option<u64>> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?;
        if response.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }
        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&size| size > 0);
        Ok(size)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExportError::Download(e.to_string()))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ExportError::Download(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(bytes = written, "Downloaded export");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_extract_token() {
        assert_eq!(
            extract_token("https://portal/de/downloadcenter/download?token=ab12CD&x=1"),
            Some("ab12CD".to_string())
        );
        assert_eq!(extract_token("https://portal/?token="), None);
        assert_eq!(extract_token("https://portal/?id=1"), None);
    }

    #[test]
    fn test_enqueue_response_token() {
        let ok: EnqueueResponse =
            serde_json::from_str(r#"{"result":"success","deeplink":"/dl?token=f00"}"#).unwrap();
        assert_eq!(ok.token().unwrap(), "f00");

        let rejected: EnqueueResponse = serde_json::from_str(r#"{"result":"error"}"#).unwrap();
        assert!(matches!(rejected.token(), Err(ExportError::Enqueue(_))));

        let no_link: EnqueueResponse = serde_json::from_str(r#"{"result":"success"}"#).unwrap();
        assert!(no_link.token().unwrap_err().to_string().contains("no deeplink"));

        let no_token: EnqueueResponse =
            serde_json::from_str(r#"{"result":"success","deeplink":"/dl?id=3"}"#).unwrap();
        assert!(no_token.token().unwrap_err().to_string().contains("token not found"));
    }

    #[test]
    fn test_request_covers_last_days() {
        let request = ExportRequest::ending(&PortalConfig::default(), date!(2025-04-05));
        assert_eq!(request.begin, date!(2025-04-01));

        let form = request.form();
        let field = |name: &str| {
            form.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
                .unwrap()
        };
        assert_eq!(field("beginn"), "01.04.2025");
        assert_eq!(field("ende"), "05.04.2025");
        assert_eq!(field("zr"), "monat");
        assert_eq!(field("wertart"), "tmw");
        assert_eq!(field("t"), r#"{"16515005":["fluesse.wassertemperatur"]}"#);
    }

    #[test]
    fn test_request_across_month_boundary() {
        let config = PortalConfig {
            days: 1,
            ..PortalConfig::default()
        };
        let request = ExportRequest::ending(&config, date!(2025-03-01));
        assert_eq!(request.begin, request.end);

        let config = PortalConfig {
            days: 3,
            ..PortalConfig::default()
        };
        let request = ExportRequest::ending(&config, date!(2025-03-01));
        assert_eq!(request.begin, date!(2025-02-27));
    }

    #[test]
    fn test_artifact_url() {
        assert_eq!(
            artifact_url("https://portal/download", "abc"),
            "https://portal/download?token=abc&dl=1"
        );
    }
}
