//! Eisbach exporter - water temperature export and HTTP API.
//!
//! Run with: `cargo run -p eisbach-exporter`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use anyhow::bail;
use clap::Parser;
use time::UtcOffset;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use eisbach_exporter::config::default_config_path;
use eisbach_exporter::{AppState, Config, Exporter, HttpPortal, TemperatureSource, api};

/// Eisbach exporter - water temperature export and HTTP API.
#[derive(Parser, Debug)]
#[command(name = "eisbach-exporter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, env = "EISBACH_EXPORTER_BIND")]
    bind: Option<String>,

    /// Seconds to serve a cached temperature (overrides config, 0 disables).
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Run one export, print the temperature and exit.
    #[arg(long)]
    once: bool,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The local offset can only be read soundly before any threads exist.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eisbach_exporter=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    tokio::runtime::Runtime::new()?.block_on(run(args, offset))
}

async fn run(args: Args, offset: UtcOffset) -> anyhow::Result<()> {
    if args.init_config {
        let path = args.config.unwrap_or_else(default_config_path);
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        Config::default().save(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_validated(path)?,
        None => Config::load_default()?,
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(ttl) = args.cache_ttl {
        config.server.cache_ttl_secs = ttl;
    }
    config.validate()?;

    let portal = HttpPortal::new(config.portal.clone())?;
    let exporter = Exporter::new(portal, config.portal.clone(), config.poll).with_offset(offset);

    if args.once {
        let temperature = exporter.temperature().await?;
        println!("{temperature}");
        return Ok(());
    }

    let state = AppState::new(Arc::new(exporter), config.server.cache_ttl());

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = config.server.bind.parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
