//! API request/response models for income records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::records::{id_or_generate, lenient_id, optional_text, parse_date, positive_amount, required_id, text_or_default};
use crate::db::handlers::income::IncomeFilter;
use crate::db::models::income::{IncomeCreateDBRequest, IncomeDBResponse, IncomeUpdateDBRequest};
use crate::errors::Error;
use crate::ledger::IncomeEntry;
use crate::types::{RecordId, UserId};

/// Description used when an income record is submitted without one
pub const DEFAULT_DESCRIPTION: &str = "Income";

/// Body of `POST /api/income`. Missing fields are validated or defaulted on conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IncomeCreate {
    /// Client-chosen id, a string or a number; generated when absent
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,
    /// ISO date, `YYYY-MM-DD`
    pub date: Option<String>,
    pub description: Option<String>,
    /// Amount in KRW, greater than 0
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Body of `PUT /api/income`: a full replacement of the record named by `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IncomeUpdate {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RecordId>,
    pub date: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

impl IncomeCreate {
    pub fn into_db_request(self, owner: UserId) -> Result<IncomeCreateDBRequest, Error> {
        Ok(IncomeCreateDBRequest {
            owner,
            date: parse_date(self.date)?,
            amount: positive_amount(self.amount)?,
            id: id_or_generate(self.id),
            description: text_or_default(self.description, DEFAULT_DESCRIPTION),
            notes: optional_text(self.notes),
        })
    }
}

impl IncomeUpdate {
    pub fn into_db_request(self) -> Result<(RecordId, IncomeUpdateDBRequest), Error> {
        let id = required_id(self.id)?;
        let request = IncomeUpdateDBRequest {
            date: parse_date(self.date)?,
            amount: positive_amount(self.amount)?,
            description: text_or_default(self.description, DEFAULT_DESCRIPTION),
            notes: optional_text(self.notes),
        };
        Ok((id, request))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncomeResponse {
    pub id: RecordId,
    pub date: String,
    pub description: String,
    /// Amount in KRW
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<IncomeDBResponse> for IncomeResponse {
    fn from(db: IncomeDBResponse) -> Self {
        Self {
            id: db.id,
            date: db.date,
            description: db.description,
            amount: db.amount,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<IncomeDBResponse> for IncomeEntry {
    fn from(db: IncomeDBResponse) -> Self {
        Self {
            id: db.id,
            date: db.date,
            description: db.description,
            amount: db.amount,
            notes: db.notes,
        }
    }
}

/// Query parameters for listing income
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListIncomeQuery {
    /// Earliest date to include (inclusive, `YYYY-MM-DD`)
    pub from: Option<String>,
    /// Latest date to include (inclusive, `YYYY-MM-DD`)
    pub to: Option<String>,
}

impl ListIncomeQuery {
    pub fn into_filter(self, owner: UserId) -> IncomeFilter {
        IncomeFilter {
            owner,
            from: optional_text(self.from),
            to: optional_text(self.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_create_applies_defaults() {
        let owner = Uuid::new_v4();
        let request = IncomeCreate {
            date: Some("2024-01-01".to_string()),
            amount: Some(Decimal::from(3_000_000)),
            description: Some("  ".to_string()),
            notes: Some("".to_string()),
            ..Default::default()
        }
        .into_db_request(owner)
        .unwrap();

        assert_eq!(request.owner, owner);
        assert!(!request.id.is_empty());
        assert_eq!(request.description, "Income");
        assert_eq!(request.notes, None);
        assert_eq!(request.amount, Decimal::from(3_000_000));
    }

    #[test]
    fn test_create_requires_date_and_amount() {
        let owner = Uuid::new_v4();
        let missing_date = IncomeCreate {
            amount: Some(Decimal::ONE),
            ..Default::default()
        };
        assert!(matches!(missing_date.into_db_request(owner), Err(Error::BadRequest { .. })));

        let zero_amount = IncomeCreate {
            date: Some("2024-01-01".to_string()),
            amount: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(matches!(zero_amount.into_db_request(owner), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_update_requires_id() {
        let update = IncomeUpdate {
            date: Some("2024-01-01".to_string()),
            amount: Some(Decimal::ONE),
            ..Default::default()
        };
        assert!(matches!(update.into_db_request(), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let from_number: IncomeCreate = serde_json::from_str(r#"{"amount": 1500.5}"#).unwrap();
        let from_string: IncomeCreate = serde_json::from_str(r#"{"amount": "1500.5"}"#).unwrap();
        assert_eq!(from_number.amount, Some(Decimal::new(15005, 1)));
        assert_eq!(from_string.amount, from_number.amount);
    }
}
