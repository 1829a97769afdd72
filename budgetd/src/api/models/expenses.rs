//! API request/response models for expense records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::records::{id_or_generate, lenient_id, optional_text, parse_date, positive_amount, required_id, text_or_default};
use crate::db::handlers::expenses::ExpenseFilter;
use crate::db::models::expenses::{ExpenseCreateDBRequest, ExpenseDBResponse, ExpenseUpdateDBRequest};
use crate::errors::Error;
use crate::ledger::{DEFAULT_CATEGORY, ExpenseEntry};
use crate::types::{RecordId, UserId};

/// Description used when an expense is submitted without one
pub const DEFAULT_DESCRIPTION: &str = "Expense";

/// Body of `POST /api/expenses`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExpenseCreate {
    /// Client-chosen id, a string or a number; generated when absent
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,
    /// ISO date, `YYYY-MM-DD`
    pub date: Option<String>,
    pub description: Option<String>,
    /// Defaults to "Other"
    pub category: Option<String>,
    /// Amount in KRW, greater than 0
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Body of `PUT /api/expenses`: a full replacement of the record named by `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExpenseUpdate {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

impl ExpenseCreate {
    pub fn into_db_request(self, owner: UserId) -> Result<ExpenseCreateDBRequest, Error> {
        Ok(ExpenseCreateDBRequest {
            owner,
            date: parse_date(self.date)?,
            amount: positive_amount(self.amount)?,
            id: id_or_generate(self.id),
            description: text_or_default(self.description, DEFAULT_DESCRIPTION),
            category: text_or_default(self.category, DEFAULT_CATEGORY),
            notes: optional_text(self.notes),
        })
    }
}

impl ExpenseUpdate {
    pub fn into_db_request(self) -> Result<(RecordId, ExpenseUpdateDBRequest), Error> {
        let id = required_id(self.id)?;
        let request = ExpenseUpdateDBRequest {
            date: parse_date(self.date)?,
            amount: positive_amount(self.amount)?,
            description: text_or_default(self.description, DEFAULT_DESCRIPTION),
            category: text_or_default(self.category, DEFAULT_CATEGORY),
            notes: optional_text(self.notes),
        };
        Ok((id, request))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub category: String,
    /// Amount in KRW
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExpenseDBResponse> for ExpenseResponse {
    fn from(db: ExpenseDBResponse) -> Self {
        Self {
            id: db.id,
            date: db.date,
            description: db.description,
            category: db.category,
            amount: db.amount,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<ExpenseDBResponse> for ExpenseEntry {
    fn from(db: ExpenseDBResponse) -> Self {
        Self {
            id: db.id,
            date: db.date,
            description: db.description,
            category: db.category,
            amount: db.amount,
            notes: db.notes,
        }
    }
}

/// Query parameters for listing expenses
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListExpensesQuery {
    /// Only expenses in this category
    pub category: Option<String>,
    /// Earliest date to include (inclusive, `YYYY-MM-DD`)
    pub from: Option<String>,
    /// Latest date to include (inclusive, `YYYY-MM-DD`)
    pub to: Option<String>,
}

impl ListExpensesQuery {
    pub fn into_filter(self, owner: UserId) -> ExpenseFilter {
        ExpenseFilter {
            owner,
            category: optional_text(self.category),
            from: optional_text(self.from),
            to: optional_text(self.to),
        }
    }
}
