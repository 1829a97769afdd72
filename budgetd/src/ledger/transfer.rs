//! JSON export and import of a user's ledger.
//!
//! The export document is
//! `{ version, rate, exportedAt, income: [...], expenses: [...], categories: [...] }`.
//!
//! Import is deliberately forgiving about record contents (ids may be numbers, amounts may be
//! strings, most fields may be missing) but strict about shape: `income` and `expenses` must both
//! be present and be lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use super::{DEFAULT_CATEGORY, MAX_AMOUNT_KRW, merge_categories};
use crate::types::{RecordId, generate_record_id};

/// Format version written to exported documents
pub const EXPORT_VERSION: u32 = 1;

/// An income record as it appears in an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IncomeEntry {
    pub id: RecordId,
    pub date: String,
    pub description: String,
    /// Amount in KRW
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

/// An expense record as it appears in an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExpenseEntry {
    pub id: RecordId,
    pub date: String,
    pub description: String,
    pub category: String,
    /// Amount in KRW
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    /// KRW per 1 USD at export time
    pub rate: f64,
    pub exported_at: DateTime<Utc>,
    pub income: Vec<IncomeEntry>,
    pub expenses: Vec<ExpenseEntry>,
    pub categories: Vec<String>,
}

impl ExportDocument {
    pub fn build(rate: f64, income: Vec<IncomeEntry>, expenses: Vec<ExpenseEntry>, categories: Vec<String>) -> Self {
        Self {
            version: EXPORT_VERSION,
            rate,
            exported_at: Utc::now(),
            income,
            expenses,
            categories,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("file is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("file must contain a JSON object")]
    NotAnObject,

    #[error("`{0}` is missing; expected a list")]
    MissingList(&'static str),

    #[error("`{0}` must be a list")]
    NotAList(&'static str),

    #[error("{list}[{index}] must be an object")]
    InvalidRecord { list: &'static str, index: usize },
}

/// A parsed but not yet normalized import file.
#[derive(Debug, Clone)]
pub struct ImportDocument {
    income: Vec<Map<String, Value>>,
    expenses: Vec<Map<String, Value>>,
    categories: Option<Vec<String>>,
}

/// Records ready to replace a user's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImport {
    pub income: Vec<IncomeEntry>,
    pub expenses: Vec<ExpenseEntry>,
    pub categories: Vec<String>,
}

impl ImportDocument {
    /// Check the document shape. Record contents are coerced later by [`ImportDocument::normalize`].
    pub fn parse(input: &[u8]) -> Result<Self, ImportError> {
        let value: Value = serde_json::from_slice(input).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
        let Value::Object(mut document) = value else {
            return Err(ImportError::NotAnObject);
        };

        let income = take_records(&mut document, "income")?;
        let expenses = take_records(&mut document, "expenses")?;

        // Optional; anything other than a list falls back to the defaults
        let categories = match document.remove("categories") {
            Some(Value::Array(names)) => Some(
                names
                    .into_iter()
                    .filter_map(|name| match name {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        };

        Ok(Self {
            income,
            expenses,
            categories,
        })
    }

    pub fn income_count(&self) -> usize {
        self.income.len()
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    /// Coerce every record into a storable entry.
    ///
    /// - missing, blank or repeated ids get a freshly generated id
    /// - amounts accept numbers or numeric strings; anything else becomes 0, and negatives clamp to 0
    /// - blank descriptions become "Income"/"Expense", blank categories become "Other"
    /// - the category list is the explicit list (or `default_categories` when absent) merged with
    ///   every category seen on the imported expenses
    pub fn normalize(self, default_categories: &[String]) -> NormalizedImport {
        let mut income_ids = HashSet::new();
        let income: Vec<IncomeEntry> = self
            .income
            .iter()
            .map(|record| IncomeEntry {
                id: unique_id(record, &mut income_ids),
                date: text(record, "date").unwrap_or_default(),
                description: text(record, "description").unwrap_or_else(|| "Income".to_string()),
                amount: amount(record),
                notes: text(record, "notes"),
            })
            .collect();

        let mut expense_ids = HashSet::new();
        let expenses: Vec<ExpenseEntry> = self
            .expenses
            .iter()
            .map(|record| ExpenseEntry {
                id: unique_id(record, &mut expense_ids),
                date: text(record, "date").unwrap_or_default(),
                description: text(record, "description").unwrap_or_else(|| "Expense".to_string()),
                category: text(record, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                amount: amount(record),
                notes: text(record, "notes"),
            })
            .collect();

        let explicit = self.categories.unwrap_or_else(|| default_categories.to_vec());
        let categories = merge_categories(
            explicit
                .iter()
                .map(String::as_str)
                .chain(expenses.iter().map(|e| e.category.as_str())),
        );

        NormalizedImport {
            income,
            expenses,
            categories,
        }
    }
}

fn take_records(document: &mut Map<String, Value>, list: &'static str) -> Result<Vec<Map<String, Value>>, ImportError> {
    match document.remove(list) {
        None | Some(Value::Null) => Err(ImportError::MissingList(list)),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                _ => Err(ImportError::InvalidRecord { list, index }),
            })
            .collect(),
        Some(_) => Err(ImportError::NotAList(list)),
    }
}

/// Trimmed, non-empty string form of a scalar field.
fn text(record: &Map<String, Value>, field: &str) -> Option<String> {
    let raw = match record.get(field)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn unique_id(record: &Map<String, Value>, seen: &mut HashSet<String>) -> RecordId {
    match text(record, "id") {
        Some(id) if seen.insert(id.clone()) => id,
        _ => loop {
            let id = generate_record_id();
            if seen.insert(id.clone()) {
                break id;
            }
        },
    }
}

fn amount(record: &Map<String, Value>) -> Decimal {
    let parsed = match record.get("amount") {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()).or_else(|| {
            // Finite floats too large for a Decimal still land on the cap
            n.as_f64()
                .and_then(|f| Decimal::from_f64(f).or_else(|| (f > 0.0).then_some(MAX_AMOUNT_KRW)))
        }),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        _ => None,
    };
    parsed.unwrap_or_default().clamp(Decimal::ZERO, MAX_AMOUNT_KRW)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Vec<String> {
        vec!["Food & Drinks".to_string(), "Other".to_string()]
    }

    fn parse(value: Value) -> Result<ImportDocument, ImportError> {
        ImportDocument::parse(value.to_string().as_bytes())
    }

    #[test]
    fn test_rejects_missing_lists() {
        assert_eq!(
            parse(json!({ "expenses": [] })).unwrap_err(),
            ImportError::MissingList("income")
        );
        assert_eq!(
            parse(json!({ "income": [], "expenses": null })).unwrap_err(),
            ImportError::MissingList("expenses")
        );
        assert_eq!(
            parse(json!({ "income": {}, "expenses": [] })).unwrap_err(),
            ImportError::NotAList("income")
        );
        assert_eq!(
            parse(json!({ "income": [1], "expenses": [] })).unwrap_err(),
            ImportError::InvalidRecord { list: "income", index: 0 }
        );
        assert_eq!(parse(json!([1, 2])).unwrap_err(), ImportError::NotAnObject);
        assert!(matches!(ImportDocument::parse(b"{not json"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn test_error_messages_name_the_field() {
        assert_eq!(ImportError::MissingList("income").to_string(), "`income` is missing; expected a list");
        assert_eq!(
            ImportError::InvalidRecord { list: "expenses", index: 3 }.to_string(),
            "expenses[3] must be an object"
        );
    }

    #[test]
    fn test_coerces_records() {
        let doc = parse(json!({
            "income": [
                { "id": 7, "date": "2024-01-01", "amount": "3000000" },
                { "date": "2024-01-15", "amount": -5, "description": "  " },
            ],
            "expenses": [
                { "id": "e1", "date": "2024-01-02", "amount": 1200000, "category": "Food & Drinks", "notes": "team dinner" },
                { "id": "e2", "amount": "lots", "category": "" },
            ],
        }))
        .unwrap();
        assert_eq!(doc.income_count(), 2);
        assert_eq!(doc.expense_count(), 2);

        let imported = doc.normalize(&defaults());

        assert_eq!(imported.income[0].id, "7");
        assert_eq!(imported.income[0].amount, Decimal::from(3_000_000));
        assert_eq!(imported.income[0].description, "Income");
        assert!(!imported.income[1].id.is_empty());
        assert_eq!(imported.income[1].amount, Decimal::ZERO);

        assert_eq!(imported.expenses[0].notes.as_deref(), Some("team dinner"));
        assert_eq!(imported.expenses[1].category, "Other");
        assert_eq!(imported.expenses[1].amount, Decimal::ZERO);
        assert_eq!(imported.expenses[1].date, "");
        assert_eq!(imported.expenses[1].description, "Expense");
    }

    #[test]
    fn test_oversized_amounts_are_clamped() {
        let imported = parse(json!({
            "income": [{ "id": "i1", "date": "2024-01-01", "amount": "79228162514264337593543950335" }],
            "expenses": [
                { "id": "e1", "date": "2024-01-02", "amount": "79228162514264337593543950335" },
                { "id": "e2", "date": "2024-01-03", "amount": 1e300 },
            ],
        }))
        .unwrap()
        .normalize(&defaults());

        assert_eq!(imported.income[0].amount, MAX_AMOUNT_KRW);
        assert!(imported.expenses.iter().all(|e| e.amount == MAX_AMOUNT_KRW));
    }

    #[test]
    fn test_repeated_ids_are_replaced() {
        let imported = parse(json!({
            "income": [],
            "expenses": [
                { "id": "dup", "amount": 1 },
                { "id": "dup", "amount": 2 },
            ],
        }))
        .unwrap()
        .normalize(&defaults());

        assert_eq!(imported.expenses[0].id, "dup");
        assert_ne!(imported.expenses[1].id, "dup");
    }

    #[test]
    fn test_category_union() {
        let without_list = parse(json!({
            "income": [],
            "expenses": [{ "amount": 1, "category": "Travel" }],
        }))
        .unwrap()
        .normalize(&defaults());
        assert_eq!(without_list.categories, vec!["Food & Drinks", "Other", "Travel"]);

        let with_list = parse(json!({
            "income": [],
            "expenses": [{ "amount": 1, "category": "Travel" }],
            "categories": ["Pets", "Pets", 3],
        }))
        .unwrap()
        .normalize(&defaults());
        assert_eq!(with_list.categories, vec!["Pets", "Travel"]);
    }

    #[test]
    fn test_export_round_trip() {
        let income = vec![IncomeEntry {
            id: "i1".to_string(),
            date: "2024-01-01".to_string(),
            description: "Salary".to_string(),
            amount: Decimal::from(3_000_000),
            notes: None,
        }];
        let expenses = vec![ExpenseEntry {
            id: "e1".to_string(),
            date: "2024-01-02".to_string(),
            description: "Groceries".to_string(),
            category: "Food & Drinks".to_string(),
            amount: Decimal::from_str("1200000.5").unwrap(),
            notes: Some("weekly".to_string()),
        }];
        let export = ExportDocument::build(1200.0, income.clone(), expenses.clone(), defaults());

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["rate"], 1200.0);
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["expenses"][0]["amount"], 1200000.5);

        let imported = ImportDocument::parse(&serde_json::to_vec(&export).unwrap())
            .unwrap()
            .normalize(&[]);
        assert_eq!(imported.income, income);
        assert_eq!(imported.expenses, expenses);
        assert_eq!(imported.categories, defaults());
    }
}
