use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use eisbach_core::{
    CachePolicy, FileCache, HttpTransport, SourceContext, Tracker, local_offset,
};
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod util;

use cli::{Cli, Commands};
use commands::{
    ConditionsArgs, HistoryArgs, PredictArgs, SurfersArgs, WatchArgs, cmd_conditions, cmd_config,
    cmd_history, cmd_predict, cmd_surfers, cmd_watch,
};
use config::Config;
use format::FormatOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The local offset can only be read soundly before any threads exist.
    let offset = local_offset();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    tokio::runtime::Runtime::new()?.block_on(run(cli, offset))
}

async fn run(cli: Cli, offset: UtcOffset) -> Result<()> {
    let config = Config::load();

    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url.clone());
    let locale = cli.locale.unwrap_or(config.locale);
    let format = cli.format.unwrap_or(config.format);
    let no_color = cli.no_color
        || config.no_color
        || cli.output.is_some()
        || !io::stdout().is_terminal();
    let cache = if cli.no_cache {
        CachePolicy::Bypass
    } else {
        CachePolicy::Use
    };

    let opts = FormatOptions {
        no_color,
        compact: cli.compact,
        offset,
    };

    let tracker = || -> Result<Tracker> {
        let transport = Arc::new(HttpTransport::with_timeout(&api_url, config.timeout())?);
        let mut ctx = SourceContext::new(transport).with_locale(locale);
        if !cli.no_cache {
            ctx = ctx.with_cache(Arc::new(FileCache::new(config.cache_dir())));
        }
        tracing::debug!(%api_url, ?locale, "Connecting to tracker backend");
        Ok(Tracker::with_offset(ctx, offset).with_alert_threshold(config.alert_threshold))
    };

    let output = cli.output.as_ref();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Conditions => {
            cmd_conditions(
                &tracker()?,
                ConditionsArgs {
                    format,
                    output,
                    cache,
                    quiet,
                    opts: &opts,
                },
            )
            .await?;
        }
        Commands::Watch { interval, count } => {
            cmd_watch(
                &tracker()?,
                WatchArgs {
                    interval,
                    count,
                    format,
                    output,
                    quiet,
                    opts: &opts,
                },
            )
            .await?;
        }
        Commands::History { view } => {
            cmd_history(
                &tracker()?,
                HistoryArgs {
                    view,
                    format,
                    output,
                    quiet,
                    opts: &opts,
                },
            )
            .await?;
        }
        Commands::Surfers { action } => {
            cmd_surfers(
                &tracker()?,
                SurfersArgs {
                    action,
                    format,
                    output,
                    cache,
                    quiet,
                    opts: &opts,
                },
            )
            .await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &Config::path(), output)?;
        }
        Commands::Predict { hour, temperature } => {
            cmd_predict(
                &tracker()?,
                PredictArgs {
                    hour,
                    temperature,
                    format,
                    output,
                    cache,
                    quiet,
                    opts: &opts,
                },
            )
            .await?;
        }
    }

    Ok(())
}
