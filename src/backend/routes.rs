use axum::{
    routing::{delete, get, post},
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallet/credit", post(handlers::credit_handler))
        .route("/api/wallet/debit", post(handlers::debit_handler))
        .route("/api/wallet/transfer", post(handlers::transfer_handler))
        .route("/api/wallet/balances", get(handlers::list_balances_handler))
        .route(
            "/api/wallet/transactions",
            get(handlers::list_transactions_handler),
        )
        .route(
            "/api/members",
            post(handlers::create_member_handler).get(handlers::list_members_handler),
        )
        .route("/api/members/:member_id", delete(handlers::delete_member_handler))
}
