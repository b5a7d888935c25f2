//! Command-line client for the Eisbach river-condition tracker.
//!
//! The `eisbach` binary talks to the tracker backend and shows what matters
//! before paddling out at the Eisbach wave in Munich.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `conditions` | Current water level, flow and temperature |
//! | `watch` | Poll the water level and chart the live window |
//! | `history` | Hourly or daily water-level chart |
//! | `surfers list` | Recorded surfer counts |
//! | `surfers add` | Record how many surfers are on the wave |
//! | `predict` | Predicted number of surfers for an hour |
//! | `config` | Manage the configuration file |
//!
//! While a request is in flight a rotating status line is printed to stderr
//! in the configured language (`--locale en|es`); `--quiet` suppresses it.
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: Machine-readable JSON (`--compact` for one line)
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/eisbach/config.toml` (or platform equivalent):
//!
//! - `api_url`: Backend base URL
//! - `locale`: `en` or `es`
//! - `format`: Default output format
//! - `no_color`: Disable colored output
//! - `alert_threshold`: Water level in cm that triggers the longboard alert
//! - `timeout`: Request timeout in seconds
//! - `cache_dir`: Where the water temperature is cached
//!
//! # Environment Variables
//!
//! - `EISBACH_API_URL`: Backend base URL (overridden by `--api-url`)
//! - `EISBACH_LOCALE`: Status message language
//! - `NO_COLOR`: Disable colored output when set
//!
//! # Examples
//!
//! ```bash
//! eisbach conditions
//! eisbach history --view daily --format json
//! eisbach surfers add --count 6
//! eisbach predict --hour 18
//! eisbach watch --interval 30 --count 10
//! ```

// Re-export core dependencies for convenience
pub use eisbach_core;
pub use eisbach_types;
