use sqlx::{PgPool, postgres::PgPoolOptions};
use crate::config::Config;
use crate::api_error::ApiError;

pub type DbPool = PgPool;

pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub async fn health_check(pool: &DbPool) -> Result<(), ApiError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

/// Connectivity failures become `UpstreamUnavailable`, constraint violations `Conflict`.
pub fn map_sqlx_error(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ApiError::upstream(err.to_string()),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            ApiError::conflict("Record is still referenced by a match")
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::conflict(db.message().to_string())
        }
        _ => ApiError::DatabaseError(err),
    }
}
