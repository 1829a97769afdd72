//! Validation shared by income and expense request bodies.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};

use crate::errors::Error;
use crate::ledger::MAX_AMOUNT_KRW;
use crate::types::{RecordId, generate_record_id};

/// Query for `DELETE /api/income` and `DELETE /api/expenses`
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RecordIdQuery {
    /// Id of the record to delete
    pub id: Option<RecordId>,
}

impl RecordIdQuery {
    pub fn require(self) -> Result<RecordId, Error> {
        required_id(self.id)
    }
}

/// Require a non-empty ISO (`YYYY-MM-DD`) date, returning it trimmed.
pub fn parse_date(date: Option<String>) -> Result<String, Error> {
    let date = date.map(|d| d.trim().to_string()).unwrap_or_default();
    if date.is_empty() {
        return Err(Error::BadRequest {
            message: "date is required".to_string(),
        });
    }
    NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| Error::BadRequest {
        message: format!("date must be an ISO date (YYYY-MM-DD), got '{date}'"),
    })?;
    Ok(date)
}

/// Require an amount strictly greater than zero and at most [`MAX_AMOUNT_KRW`].
pub fn positive_amount(amount: Option<Decimal>) -> Result<Decimal, Error> {
    match amount {
        Some(amount) if amount > MAX_AMOUNT_KRW => Err(Error::BadRequest {
            message: format!("amount must be at most {MAX_AMOUNT_KRW}"),
        }),
        Some(amount) if amount > Decimal::ZERO => Ok(amount.normalize()),
        Some(_) => Err(Error::BadRequest {
            message: "amount must be greater than 0".to_string(),
        }),
        None => Err(Error::BadRequest {
            message: "amount is required".to_string(),
        }),
    }
}

/// Deserialize an optional record id given either as a JSON string or as a number.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

/// Trimmed text, or `default` when missing or blank.
pub fn text_or_default(value: Option<String>, default: &str) -> String {
    optional_text(value).unwrap_or_else(|| default.to_string())
}

/// Trimmed text, or `None` when missing or blank.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// The submitted id, or a generated one when missing or blank.
pub fn id_or_generate(id: Option<RecordId>) -> RecordId {
    optional_text(id).unwrap_or_else(generate_record_id)
}

/// The submitted id; 400 when missing or blank.
pub fn required_id(id: Option<RecordId>) -> Result<RecordId, Error> {
    optional_text(id).ok_or_else(|| Error::BadRequest {
        message: "id is required".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(Some(" 2024-01-02 ".to_string())).unwrap(), "2024-01-02");
        assert!(matches!(parse_date(None), Err(Error::BadRequest { .. })));
        assert!(matches!(parse_date(Some("   ".to_string())), Err(Error::BadRequest { .. })));
        assert!(matches!(parse_date(Some("2024-02-30".to_string())), Err(Error::BadRequest { .. })));
        assert!(matches!(parse_date(Some("02/01/2024".to_string())), Err(Error::BadRequest { .. })));
    }

    #[test]
    fn test_positive_amount() {
        assert_eq!(positive_amount(Some(Decimal::new(150000, 2))).unwrap(), Decimal::from(1500));
        for amount in [Some(Decimal::ZERO), Some(Decimal::from(-5)), None] {
            assert!(matches!(positive_amount(amount), Err(Error::BadRequest { .. })));
        }
    }

    #[test]
    fn test_positive_amount_is_capped() {
        assert_eq!(positive_amount(Some(MAX_AMOUNT_KRW)).unwrap(), MAX_AMOUNT_KRW);
        for amount in [MAX_AMOUNT_KRW + Decimal::ONE, Decimal::MAX] {
            let err = positive_amount(Some(amount)).unwrap_err();
            assert!(err.user_message().contains("at most"), "{err}");
        }
    }

    #[test]
    fn test_text_defaults() {
        assert_eq!(text_or_default(None, "Income"), "Income");
        assert_eq!(text_or_default(Some("  ".to_string()), "Income"), "Income");
        assert_eq!(text_or_default(Some(" Bonus ".to_string()), "Income"), "Bonus");
        assert_eq!(optional_text(Some("".to_string())), None);
    }

    #[derive(Debug, Deserialize)]
    struct WithId {
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<RecordId>,
    }

    #[test]
    fn test_lenient_id() {
        let parse = |body: &str| serde_json::from_str::<WithId>(body).map(|w| w.id);
        assert_eq!(parse(r#"{"id": "rent-jan"}"#).unwrap().as_deref(), Some("rent-jan"));
        assert_eq!(parse(r#"{"id": 7}"#).unwrap().as_deref(), Some("7"));
        assert_eq!(parse(r#"{"id": null}"#).unwrap(), None);
        assert_eq!(parse(r#"{}"#).unwrap(), None);
        assert!(parse(r#"{"id": [1]}"#).is_err());
    }

    #[test]
    fn test_ids() {
        assert_eq!(id_or_generate(Some("rent-jan".to_string())), "rent-jan");
        assert!(!id_or_generate(Some(" ".to_string())).is_empty());
        assert!(matches!(required_id(None), Err(Error::BadRequest { .. })));
        assert!(matches!(RecordIdQuery { id: Some("".to_string()) }.require(), Err(Error::BadRequest { .. })));
    }
}
