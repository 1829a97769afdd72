//! API models for the ledger summary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::ledger::{CategoryBreakdown, LedgerTotals, convert_amount, format_krw, format_usd};
use crate::rates::RateSnapshot;

/// Query parameters for `GET /api/summary`
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    /// KRW per 1 USD to convert with instead of the cached rate
    pub rate: Option<f64>,
}

/// One amount in both currencies, plus display strings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Money {
    pub krw: f64,
    pub usd: f64,
    /// KRW rounded to whole won, e.g. `₩1,800,000`
    pub krw_display: String,
    /// USD rounded to cents, e.g. `$1,500.00`
    pub usd_display: String,
}

impl Money {
    fn new(krw: Decimal, krw_per_usd: f64) -> Self {
        let usd = convert_amount(krw, krw_per_usd);
        let krw = krw.to_f64().unwrap_or(0.0);
        Self {
            krw,
            usd,
            krw_display: format_krw(krw),
            usd_display: format_usd(usd),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryShareResponse {
    pub category: String,
    pub amount: Money,
    /// Share of total expense, 0 to 100
    pub pct: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub income: Money,
    pub expense: Money,
    pub remaining: Money,
    /// Per-category spending, largest first
    pub breakdown: Vec<CategoryShareResponse>,
    /// The rate used for every USD figure above
    pub rate: RateSnapshot,
}

impl SummaryResponse {
    pub fn build(totals: LedgerTotals, breakdown: CategoryBreakdown, rate: RateSnapshot) -> Self {
        let krw_per_usd = rate.krw_per_usd;
        Self {
            income: Money::new(totals.income_krw, krw_per_usd),
            expense: Money::new(totals.expense_krw, krw_per_usd),
            remaining: Money::new(totals.remaining_krw, krw_per_usd),
            breakdown: breakdown
                .shares
                .into_iter()
                .map(|share| CategoryShareResponse {
                    amount: Money::new(share.amount_krw, krw_per_usd),
                    category: share.category,
                    pct: share.pct,
                })
                .collect(),
            rate,
        }
    }
}

/// Result of `POST /api/ledger/import`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    /// Number of income records now stored
    pub income: usize,
    /// Number of expenses now stored
    pub expenses: usize,
    /// The stored category list after the import
    pub categories: Vec<String>,
}
