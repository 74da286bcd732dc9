//! `newsflow serve`: connect, migrate, and run the HTTP API.

use anyhow::{Context, Result};
use clap::Args;
use newsflow_core::ConfigLoader;
use newsflow_data::DatabaseClient;
use newsflow_web_api::{ApiServer, AppState};

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Skip applying pending migrations at startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Runs the API server until it fails or the process is stopped.
///
/// # Errors
/// Returns an error if configuration, the database, the brokerage client,
/// or the listener cannot be set up.
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config))?;

    let db = DatabaseClient::connect(&config.database).await?;
    if !args.no_migrate {
        db.migrate().await?;
    }

    let state = AppState::from_config(&config, db.repositories())?;
    tracing::info!(
        trading_url = %config.brokerage.trading_url,
        base_dollar_amount = %config.trading.base_dollar_amount,
        "Starting newsflow"
    );

    ApiServer::new(state).serve(&config.server.addr()).await
}
