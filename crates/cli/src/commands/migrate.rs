//! Database migration command.
//!
//! Applies the migrations embedded from `crates/api/migrations/`. Already
//! applied migrations are skipped.

use resona_api::db::MIGRATOR;

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
