pub mod member;
pub mod category;
pub mod transaction;

pub use member::Member;
pub use category::{ExpenseCategory, IncomeCategory};
pub use transaction::{TransactionKind, WalletTransaction};
