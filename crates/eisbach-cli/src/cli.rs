//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use eisbach_core::{Locale, ViewMode};
use serde::{Deserialize, Serialize};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "eisbach")]
#[command(author, version, about = "Client for the Eisbach river-condition tracker", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status messages and non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format (overrides config)
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Language of status messages (en, es)
    #[arg(long, global = true, env = "EISBACH_LOCALE")]
    pub locale: Option<Locale>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true, env = "EISBACH_API_URL")]
    pub api_url: Option<String>,

    /// Ignore the local cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current water level, flow and temperature
    Conditions,

    /// Poll the water level and chart the live window
    Watch {
        /// Polling interval in seconds
        #[arg(short, long, default_value = "60")]
        interval: u64,

        /// Number of readings to take before exiting (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Show the water-level history (hourly or daily)
    History {
        /// Aggregation of the chart
        #[arg(long, default_value = "hourly")]
        view: ViewMode,
    },

    /// List or add surfer counts
    Surfers {
        #[command(subcommand)]
        action: SurfersAction,
    },

    /// Predict the number of surfers
    Predict {
        /// Hour of day (0-23), defaults to the current hour
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: Option<u8>,

        /// Water temperature in °C, defaults to the latest known value
        #[arg(short, long)]
        temperature: Option<f64>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,

    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SurfersAction {
    /// List recorded counts
    List {
        /// Show only the most recent entries (0 for all)
        #[arg(short = 'n', long, default_value = "0")]
        limit: usize,
    },

    /// Record how many surfers are on the wave
    Add {
        /// Number of surfers
        #[arg(short, long)]
        count: u32,

        /// Observation time (RFC3339), defaults to now
        #[arg(long)]
        timestamp: Option<String>,

        /// Water level in cm, defaults to the current level
        #[arg(long)]
        water_level: Option<f64>,

        /// Water flow in m³/s, defaults to the current flow
        #[arg(long)]
        water_flow: Option<f64>,

        /// Water temperature in °C, defaults to the current temperature
        #[arg(long)]
        water_temperature: Option<f64>,
    },
}
