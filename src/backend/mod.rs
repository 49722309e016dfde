pub mod handlers;
mod routes;

use axum::{routing::get, Router};
use sqlx::{Pool, Sqlite};
use std::env;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
}

/// Full application router; split out so tests can drive it directly.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>) -> anyhow::Result<()> {
    let state = AppState { db: pool };
    let app = build_router(state);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    info!(%addr, "wallet backend listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
