//! Database models for income records.

use crate::types::{RecordId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for inserting an income record
#[derive(Debug, Clone)]
pub struct IncomeCreateDBRequest {
    pub owner: UserId,
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Full replacement of an income record's editable fields
#[derive(Debug, Clone)]
pub struct IncomeUpdateDBRequest {
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeDBResponse {
    pub owner: UserId,
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
