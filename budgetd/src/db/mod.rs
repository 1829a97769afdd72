//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries per table)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories borrow a `&mut SqliteConnection`, so the caller decides the transaction scope.
//! Multi-table writes (ledger import) open one transaction and hand it to several repositories:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! IncomeRecords::new(&mut tx).replace_all(owner, &income).await?;
//! ExpenseRecords::new(&mut tx).replace_all(owner, &expenses).await?;
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
