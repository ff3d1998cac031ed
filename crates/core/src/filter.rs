//! Transaction browser filters.
//!
//! Criteria hold the raw strings the user typed. Date bounds are written in
//! `criteria.calendar`, normalized to zero-padded `YYYY-MM-DD` and compared as
//! strings. Bounds of either kind that fail to parse are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::calendar::{Calendar, DateError};
use super::money::Money;
use super::transaction::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSelector {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeSelector {
    pub fn accepts(self, kind: TransactionType) -> bool {
        match self {
            TypeSelector::All => true,
            TypeSelector::Income => kind == TransactionType::Income,
            TypeSelector::Expense => kind == TransactionType::Expense,
        }
    }
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSelector::All => write!(f, "all"),
            TypeSelector::Income => write!(f, "income"),
            TypeSelector::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TypeSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TypeSelector::All),
            "income" => Ok(TypeSelector::Income),
            "expense" => Ok(TypeSelector::Expense),
            other => Err(format!("Unknown type selector: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_from: String,
    pub date_to: String,
    pub kind: TypeSelector,
    pub amount_from: String,
    pub amount_to: String,
    /// Calendar the date bounds are written in.
    pub calendar: Calendar,
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = FilterCriteria::default();
    }

    /// Number of criteria that differ from their default. The calendar
    /// selector is a display setting and never counts.
    pub fn active_count(&self) -> usize {
        [
            !self.date_from.trim().is_empty(),
            !self.date_to.trim().is_empty(),
            self.kind != TypeSelector::All,
            !self.amount_from.trim().is_empty(),
            !self.amount_to.trim().is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Switches the calendar the date bounds are written in, converting any
    /// bound already entered. A bound that cannot be converted is cleared and
    /// the first such error is returned once both bounds have been processed.
    pub fn switch_calendar(&mut self, to: Calendar) -> Result<(), DateError> {
        let from = self.calendar;
        self.calendar = to;
        if from == to {
            return Ok(());
        }

        let mut first_error = None;
        for bound in [&mut self.date_from, &mut self.date_to] {
            match Calendar::convert(bound, from, to) {
                Ok(converted) => *bound = converted,
                Err(e) => {
                    bound.clear();
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_date(transaction) && self.kind.accepts(transaction.kind) && self.matches_amount(transaction)
    }

    /// Bounds are normalized to the zero-padded rendering before comparing;
    /// a bound that is not a date is ignored.
    fn matches_date(&self, transaction: &Transaction) -> bool {
        let from = self.calendar.normalize(&self.date_from).ok();
        let to = self.calendar.normalize(&self.date_to).ok();
        if from.is_none() && to.is_none() {
            return true;
        }

        let Ok(rendered) = self.calendar.render(transaction.date) else {
            return false;
        };

        if from.is_some_and(|from| rendered < from) {
            return false;
        }
        if to.is_some_and(|to| rendered > to) {
            return false;
        }
        true
    }

    fn matches_amount(&self, transaction: &Transaction) -> bool {
        if let Some(min) = Money::parse(&self.amount_from) {
            if transaction.amount < min {
                return false;
            }
        }
        if let Some(max) = Money::parse(&self.amount_to) {
            if transaction.amount > max {
                return false;
            }
        }
        true
    }
}

/// Returns the transactions that satisfy every active criterion, in input order.
pub fn apply(transactions: &[Transaction], criteria: &FilterCriteria) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| criteria.matches(t))
        .cloned()
        .collect()
}

pub fn active_criteria_count(criteria: &FilterCriteria) -> usize {
    criteria.active_count()
}

/// `"Showing 3 of 10 transactions (2 filters applied)"`
pub fn describe_results(shown: usize, total: usize, active: usize) -> String {
    let mut line = format!("Showing {shown} of {total} transactions");
    if active > 0 {
        let plural = if active > 1 { "s" } else { "" };
        line.push_str(&format!(" ({active} filter{plural} applied)"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TransactionDraft, TransactionId};
    use chrono::{NaiveDate, Utc};

    fn tx(y: i32, m: u32, d: u32, kind: TransactionType, source: &str, cents: i64) -> Transaction {
        Transaction::new(
            TransactionId::from(source),
            TransactionDraft {
                date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                kind,
                source: source.to_string(),
                amount: Money::from_cents(cents),
            },
            Utc::now(),
        )
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(2024, 3, 1, TransactionType::Expense, "Groceries", 250_000),
            tx(2024, 2, 10, TransactionType::Income, "Freelance", 2_000_000),
            tx(2024, 1, 16, TransactionType::Expense, "Rent", 1_500_000),
            tx(2024, 1, 15, TransactionType::Income, "Salary", 5_000_000),
        ]
    }

    fn sources(txs: &[Transaction]) -> Vec<&str> {
        txs.iter().map(|t| t.source.as_str()).collect()
    }

    // ── apply ─────────────────────────────────────────────────────────────────

    #[test]
    fn default_criteria_keep_everything_in_order() {
        let txs = sample();
        let filtered = apply(&txs, &FilterCriteria::default());
        assert_eq!(filtered, txs);
    }

    #[test]
    fn type_filter() {
        let criteria = FilterCriteria {
            kind: TypeSelector::Income,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Freelance", "Salary"]);
    }

    #[test]
    fn bs_date_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            date_from: "2080-01-16".to_string(),
            date_to: "2080-02-10".to_string(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Freelance", "Rent"]);
    }

    #[test]
    fn ad_date_bounds() {
        let criteria = FilterCriteria {
            date_from: "2024-02-01".to_string(),
            calendar: Calendar::Ad,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Groceries", "Freelance"]);
    }

    #[test]
    fn unpadded_bounds_are_normalized() {
        let criteria = FilterCriteria {
            date_from: "2080-1-16".to_string(),
            date_to: "2080-2-9".to_string(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Rent"]);

        let ad = FilterCriteria {
            date_from: "2024-2-1".to_string(),
            calendar: Calendar::Ad,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &ad)), ["Groceries", "Freelance"]);
    }

    #[test]
    fn bs_bound_without_ad_counterpart_still_bounds() {
        let criteria = FilterCriteria {
            date_to: "2080-02-30".to_string(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Freelance", "Rent", "Salary"]);
    }

    #[test]
    fn malformed_date_bound_is_ignored() {
        let criteria = FilterCriteria {
            date_from: "next week".to_string(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &criteria).len(), 4);
    }

    #[test]
    fn bs_bound_against_ad_calendar_excludes_all() {
        // BS years sort after every AD year in range.
        let criteria = FilterCriteria {
            date_from: "2080-01-01".to_string(),
            calendar: Calendar::Ad,
            ..Default::default()
        };
        assert!(apply(&sample(), &criteria).is_empty());
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            amount_from: "15000".to_string(),
            amount_to: "20000".to_string(),
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Freelance", "Rent"]);
    }

    #[test]
    fn unparsable_amount_bound_is_ignored() {
        let criteria = FilterCriteria {
            amount_from: "lots".to_string(),
            amount_to: "5000".to_string(),
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Groceries"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let criteria = FilterCriteria {
            kind: TypeSelector::Expense,
            amount_from: "10000".to_string(),
            date_to: "2024-01-31".to_string(),
            calendar: Calendar::Ad,
            ..Default::default()
        };
        assert_eq!(sources(&apply(&sample(), &criteria)), ["Rent"]);
    }

    #[test]
    fn single_transaction_matches_iff_each_predicate_holds() {
        let t = tx(2024, 1, 15, TransactionType::Income, "Salary", 5_000_000);
        let cases = [
            (FilterCriteria { kind: TypeSelector::Expense, ..Default::default() }, false),
            (FilterCriteria { kind: TypeSelector::Income, ..Default::default() }, true),
            (FilterCriteria { date_from: "2080-01-15".into(), ..Default::default() }, true),
            (FilterCriteria { date_from: "2080-01-16".into(), ..Default::default() }, false),
            (FilterCriteria { date_to: "2080-01-14".into(), ..Default::default() }, false),
            (FilterCriteria { amount_to: "50000".into(), ..Default::default() }, true),
            (FilterCriteria { amount_to: "49999.99".into(), ..Default::default() }, false),
        ];
        for (criteria, expected) in cases {
            let included = apply(std::slice::from_ref(&t), &criteria).len() == 1;
            assert_eq!(included, expected, "criteria: {criteria:?}");
            assert_eq!(included, criteria.matches(&t));
        }
    }

    // ── active count ──────────────────────────────────────────────────────────

    #[test]
    fn active_count_ignores_calendar() {
        let mut criteria = FilterCriteria::default();
        assert_eq!(active_criteria_count(&criteria), 0);

        criteria.calendar = Calendar::Ad;
        assert_eq!(criteria.active_count(), 0);

        criteria.kind = TypeSelector::Expense;
        criteria.date_from = "2024-01-01".into();
        criteria.amount_to = "100".into();
        assert_eq!(criteria.active_count(), 3);

        criteria.reset();
        assert_eq!(criteria, FilterCriteria::default());
    }

    // ── calendar switching ────────────────────────────────────────────────────

    #[test]
    fn switching_calendar_converts_bounds() {
        let mut criteria = FilterCriteria {
            date_from: "2080-01-15".into(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        criteria.switch_calendar(Calendar::Ad).unwrap();
        assert_eq!(criteria.calendar, Calendar::Ad);
        assert_eq!(criteria.date_from, "2024-01-15");
        assert_eq!(criteria.date_to, "");
    }

    #[test]
    fn switching_calendar_clears_unconvertible_bound() {
        let mut criteria = FilterCriteria {
            date_from: "2081-02-29".into(),
            date_to: "2081-03-01".into(),
            calendar: Calendar::Bs,
            ..Default::default()
        };
        assert!(criteria.switch_calendar(Calendar::Ad).is_err());
        assert_eq!(criteria.date_from, "");
        assert_eq!(criteria.date_to, "2025-03-01");
    }

    #[test]
    fn describe_results_line() {
        assert_eq!(describe_results(4, 4, 0), "Showing 4 of 4 transactions");
        assert_eq!(describe_results(1, 4, 1), "Showing 1 of 4 transactions (1 filter applied)");
        assert_eq!(describe_results(0, 4, 2), "Showing 0 of 4 transactions (2 filters applied)");
    }
}
