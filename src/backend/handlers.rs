// src/backend/handlers.rs
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::{ExpenseCategory, IncomeCategory, TransactionKind};
use crate::ledger::{self, LedgerError, TransactionFilter};

#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub family_id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    pub category: IncomeCategory,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebitRequest {
    pub family_id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub family_id: i64,
    pub from_member_id: i64,
    pub to_member_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub family_id: i64,
    pub member_name: String,
}

// Stand-in for the auth layer: the resolved family scope travels as a
// query parameter on reads and deletes.
#[derive(Debug, Deserialize)]
pub struct FamilyScope {
    pub family_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub family_id: i64,
    pub member_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub page: u32,
}

/// Ledger failures rendered as `{ "error": <code>, "message": <text> }`
/// with a status the caller can branch on.
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(LedgerError::Persistence(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::InvalidAmount | LedgerError::SameMember => StatusCode::BAD_REQUEST,
            LedgerError::MemberNotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InsufficientBalance { .. } => StatusCode::CONFLICT,
            LedgerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "wallet operation failed");
        }
        let body = Json(json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub async fn credit_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posted = ledger::credit(
        &state.db,
        payload.family_id,
        payload.member_id,
        payload.amount,
        payload.category,
        payload.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

pub async fn debit_handler(
    State(state): State<AppState>,
    Json(payload): Json<DebitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posted = ledger::debit(
        &state.db,
        payload.family_id,
        payload.member_id,
        payload.amount,
        payload.category,
        payload.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

pub async fn transfer_handler(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posted = ledger::transfer(
        &state.db,
        payload.family_id,
        payload.from_member_id,
        payload.to_member_id,
        payload.amount,
        payload.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

pub async fn list_balances_handler(
    State(state): State<AppState>,
    Query(scope): Query<FamilyScope>,
) -> Result<impl IntoResponse, ApiError> {
    let balances = ledger::list_balances(&state.db, scope.family_id).await?;
    Ok(Json(balances))
}

pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TransactionFilter {
        member_id: query.member_id,
        kind: query.kind,
        page: query.page,
    };
    let transactions = ledger::list_transactions(&state.db, query.family_id, filter).await?;
    Ok(Json(transactions))
}

pub async fn create_member_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id =
        queries::create_member(&state.db, payload.family_id, &payload.member_name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "member_id": member_id }))))
}

pub async fn list_members_handler(
    State(state): State<AppState>,
    Query(scope): Query<FamilyScope>,
) -> Result<impl IntoResponse, ApiError> {
    let members = queries::get_all_members(&state.db, scope.family_id).await?;
    Ok(Json(members))
}

pub async fn delete_member_handler(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
    Query(scope): Query<FamilyScope>,
) -> Result<StatusCode, ApiError> {
    let deleted = queries::delete_member(&state.db, scope.family_id, member_id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(LedgerError::MemberNotFound { member_id }.into())
    }
}
