// src/main.rs
use dotenvy::dotenv;
use household_wallet::{backend, database};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = database::db::connection::get_db_pool().await?;
    database::db::connection::run_migrations(&pool).await?;

    backend::run_server(pool).await?;
    Ok(())
}
