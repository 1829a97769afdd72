//! Database models for the cached exchange rate.

use chrono::{DateTime, Utc};

/// The single cached rate row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateDBResponse {
    /// KRW per 1 USD
    pub krw_per_usd: f64,
    /// Name of the source that produced the rate
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExchangeRateStoreDBRequest {
    pub krw_per_usd: f64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}
