use rust_decimal::Decimal;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failure taxonomy for wallet operations.
///
/// Every variant maps to a stable machine code so the HTTP layer can render
/// specific feedback instead of a generic error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount was zero, negative, or not a whole number of cents
    #[error("amount must be a positive whole-cent value")]
    InvalidAmount,

    /// Member id did not resolve inside the caller's family scope
    #[error("member not found: {member_id}")]
    MemberNotFound { member_id: i64 },

    /// Debit or transfer exceeds the member's current balance
    #[error("insufficient balance for member {member_id}: available {available}")]
    InsufficientBalance { member_id: i64, available: Decimal },

    /// Transfer where source and destination are the same member
    #[error("cannot transfer between a member and itself")]
    SameMember,

    /// Underlying store unavailable, or transaction conflict exhausted retries
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl LedgerError {
    /// Stable code for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "invalid_amount",
            LedgerError::MemberNotFound { .. } => "member_not_found",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::SameMember => "same_member",
            LedgerError::Persistence(_) => "persistence_failure",
        }
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LedgerError::InvalidAmount.code(), "invalid_amount");
        assert_eq!(
            LedgerError::MemberNotFound { member_id: 7 }.code(),
            "member_not_found"
        );
        assert_eq!(LedgerError::SameMember.code(), "same_member");
    }
}
