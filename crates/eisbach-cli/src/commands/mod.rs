//! Command implementations for the CLI.

mod conditions;
mod config;
mod history;
mod predict;
mod surfers;
mod watch;

pub use conditions::{ConditionsArgs, cmd_conditions};
pub use config::cmd_config;
pub use history::{HistoryArgs, cmd_history};
pub use predict::{PredictArgs, cmd_predict};
pub use surfers::{SurfersArgs, cmd_surfers};
pub use watch::{WatchArgs, cmd_watch};
