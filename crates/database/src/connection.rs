use crate::error::DbError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Opens (creating if necessary) the SQLite audit database.
///
/// `sqlite::memory:` is accepted for tests; keep `max_connections` at 1 there,
/// since every in-memory connection is its own database.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
    if max_connections == 0 {
        return Err(DbError::ConnectionConfigError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::debug!(url = database_url, "Database pool ready");
    Ok(pool)
}

/// Applies the embedded migrations so the audit tables exist before the first write.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
