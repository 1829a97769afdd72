//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a mutable SQLite connection (a pooled connection or an open transaction)
//! - Provides strongly-typed operations over one table
//! - Returns models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: Accounts and password hashes
//! - [`IncomeRecords`]: Income line items, keyed by owner and record id
//! - [`ExpenseRecords`]: Expense line items, keyed by owner and record id
//! - [`Categories`]: Category names a user added explicitly
//! - [`UserSettings`]: Theme and active tab
//! - [`ExchangeRates`]: The single cached exchange rate
//!
//! # Common Pattern
//!
//! ```ignore
//! use budgetd::db::handlers::{IncomeRecords, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool, filter: &IncomeFilter) -> anyhow::Result<()> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = IncomeRecords::new(&mut tx);
//!     let rows = repo.list(filter).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod exchange_rates;
pub mod expenses;
pub mod income;
pub mod repository;
pub mod settings;
pub mod users;

pub use categories::Categories;
pub use exchange_rates::ExchangeRates;
pub use expenses::ExpenseRecords;
pub use income::IncomeRecords;
pub use repository::Repository;
pub use settings::UserSettings;
pub use users::Users;

use crate::db::errors::{DbError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Amounts are stored as canonical decimal strings; SQLite has no exact decimal type.
pub(crate) fn encode_amount(amount: &Decimal) -> String {
    amount.normalize().to_string()
}

pub(crate) fn decode_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::Other(anyhow::anyhow!("stored amount {raw:?} is not a decimal: {e}")))
}
