use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::Money;
use super::transaction::{Transaction, TransactionType};

/// Summary card figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub income: Money,
    pub expense: Money,
    /// Always `income - expense`; may be negative.
    pub net: Money,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Totals exceed the largest representable amount")]
pub struct TotalsOverflow;

impl Totals {
    pub fn of(transactions: &[Transaction]) -> Result<Self, TotalsOverflow> {
        let sum_of = |kind: TransactionType| -> Result<Money, TotalsOverflow> {
            transactions
                .iter()
                .filter(|t| t.kind == kind)
                .try_fold(Money::zero(), |acc, t| acc.checked_add(t.amount))
                .ok_or(TotalsOverflow)
        };

        let income = sum_of(TransactionType::Income)?;
        let expense = sum_of(TransactionType::Expense)?;

        Ok(Totals {
            income,
            expense,
            net: income.checked_sub(expense).ok_or(TotalsOverflow)?,
            count: transactions.len(),
        })
    }
}
