//! Exporter configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Portal endpoints and export request fields.
    pub portal: PortalConfig,
    /// Readiness polling.
    pub poll: PollConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration, collecting every field error.
    ///
    /// ```
    /// use eisbach_exporter::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.portal.validate());
        errors.extend(self.poll.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind: String,
    /// Serve the last exported temperature for this many seconds; 0 disables.
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cache_ttl_secs: 0,
        }
    }
}

impl ServerConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
            return errors;
        }

        match self.bind.rsplit_once(':') {
            None => errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            )),
            Some((_, port)) => match port.parse::<u16>() {
                Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
                Ok(_) => {}
                Err(_) => errors.push(ValidationError::new(
                    "server.bind",
                    format!("invalid port '{}': must be a number 1-65535", port),
                )),
            },
        }

        errors
    }
}

/// Portal endpoints and the fields of the export request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Human-facing download page, visited first to obtain session cookies.
    pub page_url: String,
    /// Form endpoint that enqueues an export job.
    pub enqueue_url: String,
    /// Download endpoint taking the job token.
    pub download_url: String,
    /// `Origin` header sent with the enqueue request.
    pub origin: String,
    /// Measuring station identifier.
    pub station: String,
    /// Data series exported for the station.
    pub series: String,
    /// Contact address submitted with the export request.
    pub email: String,
    /// Number of days to export, ending today.
    pub days: u32,
    /// `User-Agent` header for all portal requests.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Maximum export range in days.
pub const MAX_EXPORT_DAYS: u32 = 31;

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            page_url: "https://www.gkd.bayern.de/de/fluesse/wassertemperatur/kelheim/muenchen-himmelreichbruecke-16515005/download".to_string(),
            enqueue_url: "https://www.gkd.bayern.de/de/downloadcenter/enqueue_download".to_string(),
            download_url: "https://www.gkd.bayern.de/de/downloadcenter/download".to_string(),
            origin: "https://www.gkd.bayern.de".to_string(),
            station: "16515005".to_string(),
            series: "fluesse.wassertemperatur".to_string(),
            email: "test@test.de".to_string(),
            days: 5,
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate portal configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, url) in [
            ("portal.page_url", &self.page_url),
            ("portal.enqueue_url", &self.enqueue_url),
            ("portal.download_url", &self.download_url),
            ("portal.origin", &self.origin),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError::new(
                    field,
                    format!("'{}' must be an http(s) URL", url),
                ));
            }
        }

        if self.station.trim().is_empty() {
            errors.push(ValidationError::new("portal.station", "station cannot be empty"));
        }
        if self.series.trim().is_empty() {
            errors.push(ValidationError::new("portal.series", "series cannot be empty"));
        }
        if self.days == 0 || self.days > MAX_EXPORT_DAYS {
            errors.push(ValidationError::new(
                "portal.days",
                format!("days must be between 1 and {}", MAX_EXPORT_DAYS),
            ));
        }
        if self.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "portal.timeout_secs",
                "timeout cannot be 0",
            ));
        }

        errors
    }
}

/// Readiness polling of the export artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Readiness checks before giving up.
    pub attempts: u32,
    /// Seconds between checks.
    pub backoff_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff_secs: 3,
        }
    }
}

/// Maximum wait between readiness checks in seconds.
pub const MAX_BACKOFF_SECS: u64 = 60;

impl PollConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Validate polling configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.attempts == 0 {
            errors.push(ValidationError::new(
                "poll.attempts",
                "at least one attempt is required",
            ));
        }
        if self.backoff_secs > MAX_BACKOFF_SECS {
            errors.push(ValidationError::new(
                "poll.backoff_secs",
                format!(
                    "backoff {} is too long (maximum {} seconds)",
                    self.backoff_secs, MAX_BACKOFF_SECS
                ),
            ));
        }
        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `poll.attempts`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eisbach")
        .join("exporter.toml")
}
