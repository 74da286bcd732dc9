use anyhow::{Context, Result};
use newsflow_core::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::repositories::Repositories;

/// Postgres connection pool plus schema management.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the configured database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.url)
            .await
            .context("failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `crates/data/migrations`.
    ///
    /// # Errors
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Builds the repository set over this pool.
    #[must_use]
    pub fn repositories(&self) -> Repositories {
        Repositories::new(self.pool.clone())
    }
}
