use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn generate() -> Self {
        TransactionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        TransactionId(s.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        TransactionId(s)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

impl TransactionType {
    /// `+` for income, `-` for expense.
    pub fn sign(self) -> char {
        match self {
            TransactionType::Income => '+',
            TransactionType::Expense => '-',
        }
    }
}

/// A transaction's fields before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub source: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// Anno Domini.
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub source: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(id: TransactionId, draft: TransactionDraft, created_at: DateTime<Utc>) -> Self {
        Transaction {
            id,
            date: draft.date,
            kind: draft.kind,
            source: draft.source,
            amount: draft.amount,
            created_at,
        }
    }

    /// Replaces every user-editable field, keeping `id` and `created_at`.
    pub fn replace_with(&mut self, draft: TransactionDraft) {
        self.date = draft.date;
        self.kind = draft.kind;
        self.source = draft.source;
        self.amount = draft.amount;
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            date: self.date,
            kind: self.kind,
            source: self.source.clone(),
            amount: self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(kind: TransactionType, source: &str, cents: i64) -> TransactionDraft {
        TransactionDraft {
            date: date(2024, 1, 15),
            kind,
            source: source.to_string(),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(TransactionId::generate(), TransactionId::generate());
    }

    #[test]
    fn transaction_type_roundtrip() {
        assert_eq!("Income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!(
            TransactionType::Expense.to_string().parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn replace_with_keeps_identity() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let mut tx = Transaction::new(
            TransactionId::from("abc"),
            draft(TransactionType::Income, "Salary", 5_000_000),
            created,
        );
        tx.replace_with(draft(TransactionType::Expense, "Rent", 1_500_000));

        assert_eq!(tx.id.as_str(), "abc");
        assert_eq!(tx.created_at, created);
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.source, "Rent");
        assert_eq!(tx.amount, Money::from_cents(1_500_000));
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let tx = Transaction::new(
            TransactionId::from("1705300000000"),
            draft(TransactionType::Income, "Salary", 5_000_000),
            created,
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], "1705300000000");
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["type"], "income");
        assert_eq!(json["source"], "Salary");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn deserializes_numeric_amounts() {
        let json = r#"{
            "id": "1705300000000",
            "date": "2024-01-16",
            "type": "expense",
            "source": "Rent",
            "amount": 15000,
            "createdAt": "2024-01-16T10:00:00.000Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, Money::from_cents(1_500_000));
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.date, date(2024, 1, 16));
    }
}
