//! `newsflow add-author`: register an account in the author registry.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use newsflow_core::ConfigLoader;
use newsflow_data::{AuthorRecord, DatabaseClient};
use uuid::Uuid;

#[derive(Args, Debug, Clone)]
pub struct AddAuthorArgs {
    /// Source platform, e.g. bluesky
    #[arg(long, default_value = "bluesky")]
    pub platform: String,

    /// Account identifier on the platform (a DID on Bluesky)
    #[arg(long)]
    pub platform_id: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Background passed to the analysis workflow
    #[arg(long)]
    pub context: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Database URL, overriding the config file
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// # Errors
/// Returns an error for a blank platform ID or name, or if the database
/// write fails.
pub async fn run_add_author(args: AddAuthorArgs) -> Result<()> {
    let record = build_record(&args)?;

    let mut config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    if let Some(url) = args.db_url {
        config.database.url = url;
    }

    let db = DatabaseClient::connect(&config.database).await?;
    let id = db.repositories().authors.upsert(&record).await?;
    tracing::info!(author_id = %id, platform = %record.platform, "Author registered");
    println!("Author {id} registered on {}", record.platform);
    Ok(())
}

fn build_record(args: &AddAuthorArgs) -> Result<AuthorRecord> {
    let platform_id = args.platform_id.trim();
    let name = args.name.trim();
    if platform_id.is_empty() || name.is_empty() {
        anyhow::bail!("--platform-id and --name must not be blank");
    }

    let mut record = AuthorRecord::new(
        Uuid::new_v4().to_string(),
        &args.platform,
        platform_id,
        name,
        Utc::now(),
    );
    if let Some(context) = args.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        record = record.with_context(context);
    }
    Ok(record)
}
