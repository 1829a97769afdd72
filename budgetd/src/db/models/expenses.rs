//! Database models for expense records.

use crate::types::{RecordId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for inserting an expense record
#[derive(Debug, Clone)]
pub struct ExpenseCreateDBRequest {
    pub owner: UserId,
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Full replacement of an expense record's editable fields
#[derive(Debug, Clone)]
pub struct ExpenseUpdateDBRequest {
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDBResponse {
    pub owner: UserId,
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
