use rust_decimal::Decimal;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub member_id: i64,
    pub family_id: i64,             // tenant scope, every query filters on it
    pub member_name: String,
    pub balance: Decimal,           // stored as integer cents, surfaced as Decimal
    pub member_created_at: NaiveDateTime,
}
