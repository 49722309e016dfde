use rust_decimal::Decimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/* Append-only ledger row. Direction is encoded by `kind`, never by the
sign of `amount`. Credit/debit rows carry `member_id`; transfer rows carry
`from_member_id` and `to_member_id` in a single dual-reference record. */

#[derive(Debug, Clone, Serialize)]
pub struct WalletTransaction {
    pub transaction_id: i64,
    pub family_id: i64,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub member_id: Option<i64>,
    pub from_member_id: Option<i64>,
    pub to_member_id: Option<i64>,
    pub trans_created_at: NaiveDateTime,
}
