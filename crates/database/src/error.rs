use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
