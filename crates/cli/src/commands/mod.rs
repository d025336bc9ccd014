//! CLI command implementations.

pub mod calculator;
pub mod check;
pub mod migrate;
pub mod repair;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use resona_api::db::{self, RepositoryError};

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("{0} integrity violations found")]
    Violations(usize),

    #[error("{0} rows could not be repaired")]
    RepairFailed(usize),
}

/// Connect to the database named by `RESONA_DATABASE_URL` (or `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("RESONA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("RESONA_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(pool)
}

/// Rows looked at, changed and failed by a repair pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairSummary {
    pub checked: usize,
    pub fixed: usize,
    pub failed: usize,
}

impl RepairSummary {
    /// Log the counts and fail if any row could not be repaired.
    pub fn finish(self, pass: &str, dry_run: bool) -> Result<(), CommandError> {
        tracing::info!(
            pass,
            dry_run,
            checked = self.checked,
            fixed = self.fixed,
            failed = self.failed,
            "Repair pass complete"
        );
        if self.failed > 0 {
            return Err(CommandError::RepairFailed(self.failed));
        }
        Ok(())
    }
}
