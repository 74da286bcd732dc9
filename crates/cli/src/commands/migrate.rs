//! `newsflow migrate`: apply pending schema migrations.

use anyhow::{Context, Result};
use clap::Args;
use newsflow_core::ConfigLoader;
use newsflow_data::DatabaseClient;

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Database URL, overriding the config file
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// # Errors
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    if let Some(url) = args.db_url {
        config.database.url = url;
    }

    let db = DatabaseClient::connect(&config.database).await?;
    db.migrate().await?;
    println!("Migrations applied");
    Ok(())
}
