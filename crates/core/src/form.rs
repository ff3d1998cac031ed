use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::calendar::{self, Calendar, DateError};
use super::money::Money;
use super::transaction::{Transaction, TransactionDraft, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Source,
    Amount,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Date => write!(f, "date"),
            Field::Source => write!(f, "source"),
            Field::Amount => write!(f, "amount"),
        }
    }
}

pub const DATE_REQUIRED: &str = "Date is required";
pub const SOURCE_REQUIRED: &str = "Source/Item is required";
pub const AMOUNT_INVALID: &str = "Please enter a valid amount greater than 0";

/// Field → message for every failing field. Empty means the form is valid.
pub type ValidationErrors = BTreeMap<Field, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Invalid transaction: {}", describe(.0))]
    Invalid(ValidationErrors),
}

fn describe(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw user input for creating or editing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionForm {
    pub date: String,
    /// Calendar `date` is written in.
    pub calendar: Calendar,
    pub kind: TransactionType,
    pub source: String,
    pub amount: String,
}

impl Default for TransactionForm {
    /// Today's date in BS, expense, empty source and amount.
    fn default() -> Self {
        TransactionForm {
            date: calendar::current_bs_date()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            calendar: Calendar::Bs,
            kind: TransactionType::Expense,
            source: String::new(),
            amount: String::new(),
        }
    }
}

impl TransactionForm {
    /// Prefills the form for editing; the date is shown in BS.
    pub fn from_transaction(tx: &Transaction) -> Self {
        let (date, calendar) = match Calendar::Bs.render(tx.date) {
            Ok(bs) => (bs, Calendar::Bs),
            Err(_) => (calendar::format_iso(tx.date), Calendar::Ad),
        };
        TransactionForm {
            date,
            calendar,
            kind: tx.kind,
            source: tx.source.clone(),
            amount: tx.amount.to_plain_string(),
        }
    }

    /// Switches the calendar the date is entered in, converting the current
    /// value. On failure the form is left untouched.
    pub fn switch_calendar(&mut self, to: Calendar) -> Result<(), DateError> {
        self.date = Calendar::convert(&self.date, self.calendar, to)?;
        self.calendar = to;
        Ok(())
    }

    /// Validates and converts the form into a draft with an AD date and a
    /// trimmed source.
    pub fn into_draft(self) -> Result<TransactionDraft, FormError> {
        let mut errors = validate(&self);

        let date = if errors.contains_key(&Field::Date) {
            None
        } else {
            match self.calendar.parse(&self.date) {
                Ok(d) => Some(d),
                Err(e) => {
                    errors.insert(Field::Date, e.to_string());
                    None
                }
            }
        };

        let amount = Money::parse(&self.amount);

        match (date, amount) {
            (Some(date), Some(amount)) if errors.is_empty() => Ok(TransactionDraft {
                date,
                kind: self.kind,
                source: self.source.trim().to_string(),
                amount,
            }),
            _ => Err(FormError::Invalid(errors)),
        }
    }
}

/// Checks every field independently and reports all failures.
pub fn validate(form: &TransactionForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if form.date.trim().is_empty() {
        errors.insert(Field::Date, DATE_REQUIRED.to_string());
    }

    if form.source.trim().is_empty() {
        errors.insert(Field::Source, SOURCE_REQUIRED.to_string());
    }

    if !Money::parse(&form.amount).is_some_and(Money::is_valid_amount) {
        errors.insert(Field::Amount, AMOUNT_INVALID.to_string());
    }

    errors
}

/// The same source and amount rules applied to an already-typed draft, for
/// records that never went through a form.
pub fn validate_draft(draft: &TransactionDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if draft.source.trim().is_empty() {
        errors.insert(Field::Source, SOURCE_REQUIRED.to_string());
    }

    if !draft.amount.is_valid_amount() {
        errors.insert(Field::Amount, AMOUNT_INVALID.to_string());
    }

    errors
}
