use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::InfraError;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(InfraError::DatabaseConnection)?;

    info!(max_connections, "Connected to database!");
    Ok(pool)
}

/// Apply the embedded migrations in `apps/api/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), InfraError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
