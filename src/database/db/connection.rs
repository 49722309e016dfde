use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Pool from the DATABASE_URL environment variable.
pub async fn get_db_pool() -> Result<Pool<Sqlite>, sqlx::Error> {
    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./household_wallet.db".to_string());
    connect(&db_url).await
}

/// Pool for an explicit database URL. WAL mode plus a busy timeout so
/// concurrent writers queue instead of failing outright.
pub async fn connect(db_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
