mod bootstrap;

use std::process::ExitCode;

use anyhow::Result;
use loja_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use loja_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match bootstrap::load_startup_config(LoadOptions::default()) {
        Ok(config) => config,
        Err(failure) => {
            eprintln!("{}", failure.message);
            return ExitCode::from(failure.exit_code);
        }
    };
    init_logging(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(
                event_name = "system.server.failed",
                correlation_id = "bootstrap",
                error = %error,
                "loja-server stopped with an error"
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let app = bootstrap::bootstrap_with_config(config).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        api_base_url = %app.config.telegram.api_base_url,
        poll_timeout_secs = app.config.telegram.poll_timeout_secs,
        "loja-server polling for chat updates"
    );

    tokio::select! {
        result = app.runner.start() => result?,
        result = wait_for_shutdown() => result?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "loja-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
