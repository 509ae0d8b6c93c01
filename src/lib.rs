pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

/// `source` is the file `config` was loaded from, if any.
pub async fn run(config: Config, source: Option<PathBuf>) -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&config)?;

    match &source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command() {
        Commands::Serve => {
            config.validate()?;
            if config.uses_default_password() {
                warn!(
                    "A seed user still has the default password; set [[users]] in the config \
                     before exposing this server"
                );
            }
            let prometheus_handle = init_metrics(&config)?;
            run_server(config, prometheus_handle).await
        }

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!(
                    "Wrote default config to {}",
                    Config::default_config_path().display()
                );
            } else {
                println!(
                    "{} already exists, leaving it untouched",
                    Config::default_config_path().display()
                );
            }
            Ok(())
        }

        Commands::CheckConfig => {
            config.validate()?;
            println!("Configuration OK");
            println!("  Listen address: {}", config.bind_address());
            println!("  Log format:     {}", config.general.log_format);
            println!(
                "  Token expiry:   {} minutes",
                config.security.token_expiry_minutes
            );
            println!("  Seed users:     {}", config.users.len());
            println!(
                "  Metrics:        {}",
                if config.observability.metrics_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            Ok(())
        }

        Commands::HashPassword { password } => {
            let hash = db::hash_password(&password, Some(&config.security))?;
            println!("{hash}");
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to initialize tracing")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize tracing")?;
    }

    Ok(())
}

fn init_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let addr = config.bind_address();

    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Web server error: {e}");
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
}
