use serde::{Deserialize, Serialize};

/* Categories are a closed set per operation kind, so an invalid label is
rejected when the request is parsed instead of surfacing at query time.
Transfers carry no category. */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeCategory {
    Salary,
    Allowance,
    Reward,
    Gift,
    Other,
}

impl IncomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeCategory::Salary => "salary",
            IncomeCategory::Allowance => "allowance",
            IncomeCategory::Reward => "reward",
            IncomeCategory::Gift => "gift",
            IncomeCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Purchase,
    Food,
    Entertainment,
    Penalty,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Purchase => "purchase",
            ExpenseCategory::Food => "food",
            ExpenseCategory::Entertainment => "entertainment",
            ExpenseCategory::Penalty => "penalty",
            ExpenseCategory::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_lowercase() {
        let parsed: IncomeCategory = serde_json::from_str("\"allowance\"").unwrap();
        assert_eq!(parsed, IncomeCategory::Allowance);
        assert_eq!(
            serde_json::to_string(&ExpenseCategory::Purchase).unwrap(),
            "\"purchase\""
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let parsed = serde_json::from_str::<ExpenseCategory>("\"salary\"");
        assert!(parsed.is_err());
    }
}
