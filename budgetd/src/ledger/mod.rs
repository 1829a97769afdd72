//! Ledger computations that do not touch the database.
//!
//! Everything here is a pure function of its inputs, recomputed on every request:
//!
//! - [`conversion`]: KRW to USD conversion and display formatting
//! - [`summary`]: Income/expense totals and the per-category breakdown
//! - [`transfer`]: The JSON export document and the lenient import parser

use rust_decimal::Decimal;

pub mod conversion;
pub mod summary;
pub mod transfer;

pub use conversion::{convert, convert_amount, format_krw, format_usd};
pub use summary::{CategoryBreakdown, CategoryShare, LedgerError, LedgerTotals, merge_categories};
pub use transfer::{ExpenseEntry, ExportDocument, ImportDocument, ImportError, IncomeEntry, NormalizedImport};

/// Category assigned to expenses submitted without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Largest amount a single record may carry: 10^15 KRW.
pub const MAX_AMOUNT_KRW: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);
