//! Water temperature exporter and HTTP API for the Eisbach tracker.
//!
//! The river temperature is only published by a state hydrology portal as
//! an asynchronous download. This crate runs that export end to end:
//!
//! 1. Visit the portal's download page to obtain session cookies
//! 2. Enqueue an export job and extract its token
//! 3. Poll the artifact until it is ready (10 checks, 3 s apart by default)
//! 4. Download the ZIP, extract the CSV, strip the banner, parse the rows
//! 5. Delete the temporary archive
//!
//! The result is served as `GET /api/temperature`.
//!
//! # REST API Endpoints
//!
//! - `GET /` - Liveness string
//! - `GET /api/temperature` - Latest daily mean water temperature
//! - `GET /api/health` - Service health check
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/eisbach/exporter.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//! cache_ttl_secs = 3600
//!
//! [portal]
//! station = "16515005"
//! days = 5
//!
//! [poll]
//! attempts = 10
//! backoff_secs = 3
//! ```

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod exporter;
pub mod poll;
pub mod portal;
pub mod state;

pub use config::{Config, ConfigError, PollConfig, PortalConfig, ServerConfig, ValidationError};
pub use error::{ExportError, Result};
pub use exporter::{Exporter, TemperatureSource};
pub use portal::{EnqueueResponse, ExportRequest, HttpPortal, Portal};
pub use state::AppState;
