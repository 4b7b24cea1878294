use shared_error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Initialize the Postgres connection pool shared by every repository.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(AppError::from)
}
