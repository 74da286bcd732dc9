use clap::{Parser, Subcommand};

mod commands;

use commands::{AddAuthorArgs, MarketStatusArgs, MigrateArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "newsflow")]
#[command(about = "News-driven trade execution engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web API server
    Serve(ServeArgs),
    /// Print whether the regular session is open
    MarketStatus(MarketStatusArgs),
    /// Apply pending database migrations
    Migrate(MigrateArgs),
    /// Register an author whose posts are analysed
    AddAuthor(AddAuthorArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::MarketStatus(args) => commands::run_market_status(&args)?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::AddAuthor(args) => commands::run_add_author(args).await?,
    }

    Ok(())
}
