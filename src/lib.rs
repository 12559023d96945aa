pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod drafting;
pub mod export;
pub mod models;
pub mod stage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Errors that stop the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database unavailable: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("Server failed to start: {0}")]
    Server(String),

    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env();
    tracing::info!(
        database = %config.database_path.display(),
        bind = %config.bind_addr,
        openai = config.openai_api_key.is_some(),
        gemini = config.gemini_api_key.is_some(),
        "Configuration loaded"
    );

    {
        let conn = db::open_database(&config.database_path)?;
        let report = db::seed::seed_defaults(&conn)?;
        tracing::info!(
            permissions = report.permissions,
            admin_role = %report.admin_role_id,
            "Access-control defaults seeded"
        );
    }

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config));
    let mut server = api::start_api_server(core, bind_addr)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
