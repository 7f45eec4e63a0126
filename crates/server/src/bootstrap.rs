use std::sync::Arc;

use loja_bot::{
    conversation_dispatcher, ConversationService, PollingRunner, ReconnectPolicy,
    TelegramTransport, TransportError,
};
use loja_core::catalog::{Catalog, CatalogError};
use loja_core::config::{AppConfig, ConfigError, LoadOptions};
use loja_core::flows::FlowEngine;
use loja_db::{connect, migrations, DbPool, SqlSessionRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runner: PollingRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Exit status when the bot cannot start because of its configuration.
pub const CONFIG_EXIT_CODE: u8 = 2;

/// A startup refusal: the diagnostic for stderr and the process exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupFailure {
    pub exit_code: u8,
    pub message: String,
}

/// Loads the configuration and insists on a bot token before anything else runs.
pub fn load_startup_config(options: LoadOptions) -> Result<AppConfig, StartupFailure> {
    let config = AppConfig::load(options).map_err(config_failure)?;
    config.require_bot_token().map_err(config_failure)?;
    Ok(config)
}

fn config_failure(error: ConfigError) -> StartupFailure {
    StartupFailure { exit_code: CONFIG_EXIT_CODE, message: format!("loja-server: {error}") }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.require_bot_token()?;

    let catalog = Catalog::load_or_builtin(config.catalog.path.as_deref())?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        categories = catalog.categories().len(),
        source = if config.catalog.path.is_some() { "file" } else { "builtin" },
        "catalog loaded"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let sessions = Arc::new(SqlSessionRepository::new(db_pool.clone()));
    let service = ConversationService::new(FlowEngine::new(Arc::new(catalog)), sessions);
    let transport = Arc::new(TelegramTransport::new(&config.telegram)?);
    let runner = PollingRunner::new(
        transport,
        conversation_dispatcher(service),
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, runner })
}
