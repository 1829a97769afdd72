//! Totals and category breakdowns.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A running total left the range a `Decimal` can hold
    #[error("ledger total overflowed while summing {what}")]
    Overflow { what: &'static str },
}

fn checked_sum(amounts: impl IntoIterator<Item = Decimal>, what: &'static str) -> Result<Decimal, LedgerError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or(LedgerError::Overflow { what })
}

/// Income, expense and what is left, in KRW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerTotals {
    pub income_krw: Decimal,
    pub expense_krw: Decimal,
    pub remaining_krw: Decimal,
}

impl LedgerTotals {
    pub fn compute(
        income: impl IntoIterator<Item = Decimal>,
        expenses: impl IntoIterator<Item = Decimal>,
    ) -> Result<Self, LedgerError> {
        let income_krw = checked_sum(income, "income")?;
        let expense_krw = checked_sum(expenses, "expenses")?;
        let remaining_krw = income_krw
            .checked_sub(expense_krw)
            .ok_or(LedgerError::Overflow { what: "the remainder" })?;
        Ok(Self {
            income_krw,
            expense_krw,
            remaining_krw,
        })
    }
}

/// One category's slice of total spending.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount_krw: Decimal,
    /// Percentage of total expense, 0 to 100
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryBreakdown {
    pub total_krw: Decimal,
    /// Largest share first; ties ordered by name
    pub shares: Vec<CategoryShare>,
}

impl CategoryBreakdown {
    /// Fold `(category, amount)` pairs into per-category totals.
    ///
    /// Percentages are taken against the total expense, or against 1 when there is none, so an empty
    /// or all-zero ledger reports 0% everywhere rather than dividing by zero.
    pub fn compute<'a>(expenses: impl IntoIterator<Item = (&'a str, Decimal)>) -> Result<Self, LedgerError> {
        let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
        for (category, amount) in expenses {
            let entry = by_category.entry(category).or_default();
            *entry = entry
                .checked_add(amount)
                .ok_or(LedgerError::Overflow { what: "a category" })?;
        }

        let total_krw = checked_sum(by_category.values().copied(), "expenses")?;
        let denominator = if total_krw.is_zero() { Decimal::ONE } else { total_krw };

        let mut shares: Vec<CategoryShare> = by_category
            .into_iter()
            .map(|(category, amount_krw)| CategoryShare {
                category: category.to_string(),
                amount_krw,
                pct: (amount_krw / denominator * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0),
            })
            .collect();
        // BTreeMap already yields names in order; the stable sort keeps that for equal amounts
        shares.sort_by(|a, b| b.amount_krw.cmp(&a.amount_krw));

        Ok(Self { total_krw, shares })
    }
}

/// Merge category names from several sources into one deduplicated list.
///
/// Names are trimmed, blanks are dropped, and the first occurrence decides the position.
pub fn merge_categories<I, S>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for name in sources {
        let name = name.as_ref().trim();
        if !name.is_empty() && seen.insert(name.to_string()) {
            merged.push(name.to_string());
        }
    }
    merged
}
